use std::sync::Arc;

use ledger::Ledger;
use shared::{
    domain::{GameInput, KeyMap, UNKNOWN_ORIGIN},
    error::InputError,
    protocol::InputEvent,
};
use tracing::{debug, info};

use crate::{dispatcher::Dispatcher, observers::ObserverRegistry};

/// Single entry point for accepted user actions.
#[derive(Clone)]
pub struct InputGateway {
    keys: Arc<KeyMap>,
    ledger: Ledger,
    observers: ObserverRegistry,
    dispatcher: Dispatcher,
}

impl InputGateway {
    pub fn new(
        keys: KeyMap,
        ledger: Ledger,
        observers: ObserverRegistry,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            keys: Arc::new(keys),
            ledger,
            observers,
            dispatcher,
        }
    }

    /// Validates `action_id` and fans the resulting event out to the ledger,
    /// the observers and the dispatch queue.
    ///
    /// Returns as soon as the three hand-offs are queued; none of them waits
    /// on I/O. Dispatch order across calls is the order of `submit` calls.
    /// Unknown actions return [`InputError::UnknownCommand`] with no side
    /// effects.
    pub fn submit(
        &self,
        action_id: &str,
        origin_id: Option<&str>,
    ) -> Result<InputEvent, InputError> {
        let input = GameInput::from_action_id(action_id)?;
        let origin = origin_id
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .unwrap_or(UNKNOWN_ORIGIN);
        let event = InputEvent::new(origin, self.keys.command_for(input));

        self.ledger.record(event.ledger_record());
        let observers = self.observers.broadcast(&event.observer_frame());
        self.dispatcher.enqueue(event.command.clone());

        info!(username = %event.origin_id, %input, "input accepted");
        debug!(observers, "input broadcast");
        Ok(event)
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
