//! Event dispatcher — pure routing over event shape.
//!
//! Picks the terminal handler for an event and executes it through the
//! middleware chain. Holds no mutable state of its own; events the
//! dispatcher declines to route (empty text, unknown commands) skip
//! the chain entirely and yield the empty response.

use crate::content::{self, tokens};
use crate::middleware::MiddlewareChain;
use crate::workflow::Workflow;
use pitchbot_core::event::{EventKind, InboundEvent, Response};
use tracing::debug;

pub struct Dispatcher {
    chain: MiddlewareChain,
    workflow: Workflow,
}

impl Dispatcher {
    pub fn new(chain: MiddlewareChain, workflow: Workflow) -> Self {
        Self { chain, workflow }
    }

    /// Route an event to its handler. Always returns a response,
    /// possibly empty.
    pub async fn dispatch(&self, event: &InboundEvent) -> Response {
        match &event.kind {
            EventKind::Command { name, .. } => match name.as_str() {
                "start" => self.chain.run(event, || async { content::main_menu() }).await,
                "help" => self.chain.run(event, || async { content::help() }).await,
                other => {
                    debug!("ignoring unknown command /{other}");
                    Response::empty()
                }
            },
            EventKind::Callback { token } => {
                let token = token.clone();
                self.chain
                    .run(event, move || async move {
                        match token.as_str() {
                            tokens::LEARN_MORE => content::learn_more(),
                            tokens::GET_STARTED => content::get_started(),
                            tokens::CONTACT => content::contact(),
                            tokens::MAIN_MENU => content::main_menu(),
                            unknown => {
                                debug!("ignoring unknown callback token '{unknown}'");
                                Response::empty()
                            }
                        }
                    })
                    .await
            }
            EventKind::Text { body } if !body.trim().is_empty() => {
                self.chain
                    .run(event, || self.workflow.handle_text(event))
                    .await
            }
            EventKind::Text { .. } => Response::empty(),
        }
    }
}
