//! # Dispatch Loop
//!
//! This module defines the `ActorCell`, the task that owns one mailbox and the actor's
//! current behavior. It is the "server" half of every actor: the only code that ever reads
//! the mailbox or touches the behavior.
//!
//! ## Processing
//!
//! * **One envelope at a time** – an envelope is fully handled, including the behavior
//!   transition it causes, before the next one is taken.
//! * **FIFO** – envelopes are taken in the order the mailbox received them; stop requests
//!   and timer fires queue up behind earlier messages.
//! * **Fair** – after `throughput` envelopes the cell yields its worker thread.
//!
//! ## Directive resolution
//!
//! | handler returned | effect                                                  |
//! |------------------|---------------------------------------------------------|
//! | `same`           | keep the current behavior                               |
//! | `unhandled`      | keep the current behavior, publish an `UnhandledMessage` |
//! | `stopped`        | stop the actor                                          |
//! | anything else    | start it and make it the current behavior               |
//!
//! ## Stopping
//!
//! The last behavior receives [`Signal::PostStop`] exactly once. Timers, watches and
//! children are released, the mailbox is closed and whatever was still queued is discarded.

use crate::actor_ref::ActorRef;
use crate::behavior::{interpret_message, interpret_signal, resolve, start, Behavior, Outcome};
use crate::context::Context;
use crate::message::{Envelope, Message, Signal, TimerPayload, UnhandledMessage};
use crate::system::ActorSystem;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, trace, Instrument};

enum Flow {
    Continue,
    Stop,
}

pub(crate) struct ActorCell<M> {
    receiver: mpsc::UnboundedReceiver<Envelope<M>>,
    ctx: Context<M>,
}

impl<M: Message> ActorCell<M> {
    pub(crate) fn new(
        self_ref: ActorRef<M>,
        receiver: mpsc::UnboundedReceiver<Envelope<M>>,
        system: ActorSystem,
    ) -> Self {
        Self {
            receiver,
            ctx: Context::new(self_ref, system),
        }
    }

    pub(crate) async fn run(self, initial: Behavior<M>) {
        let span = info_span!("actor", id = %self.ctx.id(), path = %self.ctx.path());
        self.run_loop(initial).instrument(span).await
    }

    async fn run_loop(mut self, initial: Behavior<M>) {
        let message_type = std::any::type_name::<M>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(message_type, "Actor started");

        let mut behavior = start(initial, &mut self.ctx);
        if behavior.is_stopped() {
            info!("Actor stopped during start");
            self.finish(None);
            return;
        }

        let shutdown = self.ctx.system().shutdown_token();
        let throughput = self.ctx.system().config().throughput.max(1);
        let mut processed = 0usize;

        loop {
            let envelope = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("System shutdown");
                    break;
                }
                envelope = self.receiver.recv() => match envelope {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            trace!(kind = envelope.kind(), "Dispatch");
            if let Flow::Stop = self.dispatch(&mut behavior, envelope) {
                break;
            }

            processed += 1;
            if processed % throughput == 0 {
                tokio::task::yield_now().await;
            }
        }

        self.finish(Some(behavior));
    }

    fn dispatch(&mut self, behavior: &mut Behavior<M>, envelope: Envelope<M>) -> Flow {
        let mut is_message = false;
        let next = match envelope {
            Envelope::Message(msg) => {
                is_message = true;
                interpret_message(behavior, &mut self.ctx, msg)
            }
            Envelope::Signal(Signal::Terminated(id)) if !self.ctx.accept_terminated(id) => {
                trace!(watched = %id, "Terminated for unwatched actor dropped");
                return Flow::Continue;
            }
            Envelope::Signal(signal) => interpret_signal(behavior, &mut self.ctx, &signal),
            Envelope::Timer {
                key,
                generation,
                payload,
            } => {
                if !self.ctx.timers().accept(&key, generation) {
                    trace!(%key, generation, "Stale timer dropped");
                    return Flow::Continue;
                }
                match payload {
                    TimerPayload::Message(msg) => {
                        is_message = true;
                        interpret_message(behavior, &mut self.ctx, msg)
                    }
                    TimerPayload::Signal => {
                        interpret_signal(behavior, &mut self.ctx, &Signal::Timeout(key))
                    }
                }
            }
            Envelope::Stop => {
                debug!("Stop requested");
                return Flow::Stop;
            }
        };

        match resolve(next, &mut self.ctx) {
            Outcome::Same => Flow::Continue,
            Outcome::Unhandled => {
                // Unhandled signals are expected and never reported.
                if is_message {
                    self.ctx.system().publish_unhandled(UnhandledMessage {
                        actor: self.ctx.id(),
                        path: self.ctx.path().to_string(),
                        message_type: std::any::type_name::<M>(),
                    });
                }
                Flow::Continue
            }
            Outcome::Stopped => Flow::Stop,
            Outcome::Replace(started) => {
                debug!(from = behavior.name(), to = started.name(), "Behavior replaced");
                *behavior = started;
                Flow::Continue
            }
        }
    }

    fn finish(mut self, behavior: Option<Behavior<M>>) {
        if let Some(mut behavior) = behavior {
            // The result is ignored: the actor is stopping regardless.
            let _ = interpret_signal(&mut behavior, &mut self.ctx, &Signal::PostStop);
        }
        self.ctx.release();

        self.receiver.close();
        let mut discarded = 0usize;
        while self.receiver.try_recv().is_ok() {
            discarded += 1;
        }
        self.ctx.self_ref().termination_token().cancel();

        if discarded > 0 && self.ctx.system().config().log_dead_letters {
            info!(discarded, "Envelopes discarded on stop");
        }
        info!("Actor stopped");
    }
}
