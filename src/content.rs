//! Static menu, help, and workflow message payloads, plus the callback
//! tokens the inline buttons carry.

use pitchbot_core::event::{Button, Response};

/// Callback tokens understood by the dispatcher.
pub mod tokens {
    pub const LEARN_MORE: &str = "learn_more";
    pub const GET_STARTED: &str = "get_started";
    pub const CONTACT: &str = "contact";
    pub const MAIN_MENU: &str = "main_menu";
}

/// How much of a submitted idea is echoed back to the user.
const IDEA_ECHO_LEN: usize = 100;

/// The `/start` menu: welcome text plus the three entry buttons.
pub fn main_menu() -> Response {
    Response::with_keyboard(
        "🚀 Welcome to PitchBot — your product development copilot!\n\n\
         Share a product idea and get a generated business plan, reviewed \
         by a human expert.\n\n\
         What would you like to do?",
        vec![
            vec![
                Button::new("Learn More", tokens::LEARN_MORE),
                Button::new("Get Started", tokens::GET_STARTED),
            ],
            vec![Button::new("Contact Support", tokens::CONTACT)],
        ],
    )
}

/// The `/help` text.
pub fn help() -> Response {
    Response::text(
        "🔍 PitchBot Help\n\n\
         Available commands:\n\
         /start — Show the main menu\n\
         /help — Show this help message\n\n\
         Simply type your product idea to get started!",
    )
}

pub fn learn_more() -> Response {
    Response::with_keyboard(
        "🌟 PitchBot: AI + Human Expertise\n\n\
         We offer:\n\
         • Generated business planning\n\
         • Expert human validation\n\
         • Fast turnaround\n\
         • Real-time guidance\n\n\
         Ready to start your journey?",
        vec![vec![Button::new("Get Started", tokens::GET_STARTED)]],
    )
}

pub fn get_started() -> Response {
    Response::text(
        "🎯 Let's Begin Your Journey\n\n\
         1. Share your product idea\n\
         2. Receive a generated plan\n\
         3. Reply \"approve\" to confirm\n\
         4. An expert reviews your plan\n\n\
         Type your product idea below to begin!",
    )
}

pub fn contact() -> Response {
    Response::with_keyboard(
        "📞 Need Support?\n\n\
         Our team is here to help!\n\
         • Email: support@pitchbot.dev\n\
         • Hours: 24/7\n\n\
         We typically respond within 2 hours.",
        vec![vec![Button::new("Back to Menu", tokens::MAIN_MENU)]],
    )
}

/// Reply for a successful idea submission: truncated echo, the plan,
/// and the approval instruction.
pub fn plan_reply(idea: &str, plan: &str) -> Response {
    Response::with_keyboard(
        format!(
            "🤖 Here's a business plan for your idea:\n\n\
             「{}」\n\n\
             {plan}\n\n\
             If you're happy with this, reply with \"approve\" to submit it \
             for expert review.",
            truncate_chars(idea, IDEA_ECHO_LEN)
        ),
        vec![vec![Button::new("Back to Menu", tokens::MAIN_MENU)]],
    )
}

pub fn generation_failed() -> Response {
    Response::text(
        "⚠️ I couldn't generate a plan for that idea right now. \
         Please try again in a moment.",
    )
}

pub fn submit_first() -> Response {
    Response::text("Please submit your product idea first.")
}

pub fn approval_reminder() -> Response {
    Response::text(
        "If you approve the business plan, please reply with \"approve\" to submit it.",
    )
}

pub fn approval_confirmed() -> Response {
    Response::text(
        "✅ Thank you! Your idea is now under expert review. We'll update you soon.",
    )
}

pub fn already_approved() -> Response {
    Response::text(
        "Your idea is already under expert review. \
         Send a new product idea to start another round.",
    )
}

pub fn forward_failed() -> Response {
    Response::text(
        "⚠️ Your approval was recorded, but we couldn't reach the review team. \
         Our team has been notified.",
    )
}

/// The payload forwarded to the reviewer chat on approval.
pub fn reviewer_payload(idea: &str, plan: &str) -> String {
    format!("New product idea for review:\n\nIdea: {idea}\n\nBusiness Plan:\n{plan}")
}

/// Truncate to a character budget, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_has_three_buttons() {
        let menu = main_menu();
        let buttons: Vec<_> = menu.keyboard.iter().flatten().collect();
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0].token, tokens::LEARN_MORE);
        assert_eq!(buttons[1].token, tokens::GET_STARTED);
        assert_eq!(buttons[2].token, tokens::CONTACT);
    }

    #[test]
    fn test_get_started_has_no_buttons() {
        assert!(get_started().keyboard.is_empty());
    }

    #[test]
    fn test_contact_offers_way_back() {
        let back = &contact().keyboard[0][0];
        assert_eq!(back.token, tokens::MAIN_MENU);
    }

    #[test]
    fn test_plan_reply_echoes_truncated_idea() {
        let idea = "x".repeat(150);
        let reply = plan_reply(&idea, "the plan");
        assert!(reply.text.contains(&"x".repeat(100)));
        assert!(!reply.text.contains(&"x".repeat(101)));
        assert!(reply.text.contains("..."));
        assert!(reply.text.contains("the plan"));
        assert!(reply.text.contains("approve"));
    }

    #[test]
    fn test_short_idea_not_truncated() {
        let reply = plan_reply("AI fridge", "plan");
        assert!(reply.text.contains("AI fridge"));
        assert!(!reply.text.contains("AI fridge..."));
    }

    #[test]
    fn test_forward_failed_keeps_approval_without_promising_redelivery() {
        let text = &forward_failed().text;
        assert!(text.contains("approval was recorded"));
        // There is no automatic redelivery, so the copy must not claim one.
        assert!(!text.to_lowercase().contains("retry"));
    }

    #[test]
    fn test_reviewer_payload_format() {
        let payload = reviewer_payload("AI fridge", "Step 1: build it");
        assert_eq!(
            payload,
            "New product idea for review:\n\nIdea: AI fridge\n\nBusiness Plan:\nStep 1: build it"
        );
    }
}
