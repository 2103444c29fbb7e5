//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were decided and persisted.
    pub events: Vec<A::Event>,

    /// The aggregate version after the command.
    pub new_version: Version,
}

/// Events decided for an aggregate that have not been persisted yet.
#[derive(Debug)]
pub struct Decision<A: Aggregate> {
    pub aggregate_id: AggregateId,

    /// The state the decision was made against.
    pub aggregate: A,

    pub events: Vec<A::Event>,
}

impl<A: Aggregate> Decision<A> {
    /// Returns true if the command decided to change nothing.
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

/// Whether a command may address an aggregate that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationPolicy {
    /// The command may run against a not-yet-created aggregate.
    CreateIfMissing,

    /// The aggregate must already exist.
    Existing,
}

/// Trait for commands that can be executed against an aggregate.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> &AggregateId;
}

/// Executes commands against event-sourced aggregates.
///
/// The handler:
/// 1. Replays the aggregate's stream from the event store
/// 2. Rejects commands on deleted (and, unless creating, missing) aggregates
/// 3. Runs the decision to produce events
/// 4. Appends the events with an expected-version check and folds them in
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate by replaying its stream.
    ///
    /// An unknown aggregate yields the default (not yet created) instance.
    pub async fn load(&self, aggregate_id: &AggregateId) -> Result<A, DomainError> {
        let envelopes = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in envelopes {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning `None` if it was never created.
    pub async fn load_existing(&self, aggregate_id: &AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Loads the aggregate and decides the command without persisting anything.
    pub async fn decide<F>(
        &self,
        aggregate_id: &AggregateId,
        creation: CreationPolicy,
        command_fn: F,
    ) -> Result<Decision<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let aggregate = self.load(aggregate_id).await?;

        if aggregate.is_deleted() {
            return Err(DomainError::AggregateDeleted {
                aggregate_type: A::aggregate_type(),
                aggregate_id: aggregate_id.clone(),
            });
        }

        if creation == CreationPolicy::Existing && aggregate.id().is_none() {
            return Err(DomainError::AggregateNotFound {
                aggregate_type: A::aggregate_type(),
                aggregate_id: aggregate_id.clone(),
            });
        }

        let events = command_fn(&aggregate)?;

        Ok(Decision {
            aggregate_id: aggregate_id.clone(),
            aggregate,
            events,
        })
    }

    /// Persists a decision and folds its events into the aggregate.
    pub async fn commit(&self, decision: Decision<A>) -> Result<CommandResult<A>, DomainError> {
        let Decision {
            aggregate_id,
            mut aggregate,
            events,
        } = decision;
        let current_version = aggregate.version();

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events,
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(&aggregate_id, current_version, &events)?;
        let options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };

        let new_version = self.store.append(envelopes, options).await?;

        aggregate.apply_events(events.iter().cloned());
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Decides a command and persists the resulting events.
    pub async fn execute<F>(
        &self,
        aggregate_id: &AggregateId,
        creation: CreationPolicy,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let decision = self.decide(aggregate_id, creation, command_fn).await?;
        self.commit(decision).await
    }

    fn build_envelopes(
        &self,
        aggregate_id: &AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id.clone())
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload(event)?
                .build()?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
