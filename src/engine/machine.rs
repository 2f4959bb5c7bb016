//! State machine that dispatches lifecycle callbacks around transitions.

use crate::builder::BuildError;
use crate::core::{StateHistory, StateName, StateTransition};
use crate::definition::{Definition, EventOperation, InitializationPolicy, TransitionTable};
use crate::engine::callbacks::{Callback, CallbackRegistry, CallbackResult, Slot, Verdict};
use crate::engine::context::{EventContext, Extras, MachineId, PendingTransition, CHAINED_EVENT};
use crate::engine::error::FireError;
use chrono::Utc;
use tracing::{debug, trace, warn};

/// Where the machine is in its firing protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DispatchStatus {
    /// Ready to fire
    #[default]
    Idle,

    /// Running the callbacks of a firing
    InTransition,

    /// Held by a `leave` callback until resumed
    PendingAsync,
}

/// Outcome of a firing that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum FireResult {
    /// The destination state was entered
    Committed,

    /// A `before` callback cancelled the event
    Cancelled,

    /// A `leave` callback held the transition; resume it with the ticket
    Pending(PendingTransition),

    /// The event leads back to the current state; only `leave` ran
    Unchanged,
}

impl FireResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        match self {
            Self::Pending(ticket) => Some(ticket),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Stage {
    Before,
    Leave,
    Enter,
    ChangeState,
    After,
}

impl Stage {
    /// Primary slot and its bare-name alias.
    fn slots(self, ctx: &EventContext) -> (Slot, Option<Slot>) {
        match self {
            Self::Before => (Slot::before(ctx.event.as_str()), None),
            Self::Leave => (Slot::leave(ctx.src.clone()), None),
            Self::Enter => (
                Slot::enter(ctx.dst.clone()),
                Some(Slot::named(ctx.dst.as_str())),
            ),
            Self::ChangeState => (Slot::ChangeState, None),
            Self::After => (
                Slot::after(ctx.event.as_str()),
                Some(Slot::named(ctx.event.as_str())),
            ),
        }
    }

    fn honours(self, verdict: Verdict) -> bool {
        match verdict {
            Verdict::Continue => true,
            Verdict::Cancel => matches!(self, Self::Before),
            Verdict::Defer => matches!(self, Self::Leave),
        }
    }
}

/// A live finite state machine.
///
/// Built from a validated [`Definition`]. The current state only changes
/// through [`fire`](Self::fire), [`resume_transition`](Self::resume_transition)
/// and chained transitions requested from callbacks.
///
/// # Example
///
/// ```rust
/// use turnstile::builder::MachineBuilder;
///
/// let mut fsm = MachineBuilder::new()
///     .initial("green")
///     .event("warn", "green", "yellow")
///     .event("panic", "yellow", "red")
///     .build()
///     .unwrap();
///
/// assert!(fsm.is_state("green"));
/// assert!(fsm.can("warn"));
/// assert!(fsm.cannot("panic"));
///
/// fsm.fire("warn").unwrap();
/// assert!(fsm.is_state("yellow"));
/// ```
#[derive(Debug)]
pub struct Machine {
    id: MachineId,
    current: StateName,
    table: TransitionTable,
    callbacks: CallbackRegistry,
    status: DispatchStatus,
    pending: Option<EventContext>,
    history: StateHistory,
    policy: InitializationPolicy,
}

impl Machine {
    /// Validate `definition` and build a machine from it.
    ///
    /// A named initial state is entered immediately by firing the initial
    /// event, so `callbacks` see that transition too.
    pub fn new(definition: Definition, callbacks: CallbackRegistry) -> Result<Self, BuildError> {
        definition.check()?;

        let policy = definition.policy();
        let startup = policy
            .fires_at_construction()
            .then(|| policy.initial_event().map(|(event, _)| event.to_string()))
            .flatten();

        let mut machine = Self {
            id: MachineId::new(),
            current: StateName::none(),
            table: definition.table(),
            callbacks,
            status: DispatchStatus::Idle,
            pending: None,
            history: StateHistory::new(),
            policy,
        };

        debug!(
            machine = %machine.id,
            events = machine.table.operations().count(),
            "machine constructed"
        );

        if let Some(event) = startup {
            machine.fire(&event)?;
        }

        Ok(machine)
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn current(&self) -> &StateName {
        &self.current
    }

    pub fn status(&self) -> DispatchStatus {
        self.status
    }

    pub fn policy(&self) -> &InitializationPolicy {
        &self.policy
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Keep at most `limit` transitions in the history; `None` keeps all.
    pub fn set_history_limit(&mut self, limit: Option<usize>) {
        self.history.set_limit(limit);
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// The generated event operations, one per distinct event name.
    pub fn operations(&self) -> impl Iterator<Item = &EventOperation> {
        self.table.operations()
    }

    /// Return true if `state` is the current state.
    pub fn is_state(&self, state: &str) -> bool {
        self.current == state
    }

    /// Return true if `event` can be fired now.
    pub fn can(&self, event: &str) -> bool {
        self.status == DispatchStatus::Idle
            && self.table.lookup(event, self.current.as_str()).is_some()
    }

    pub fn cannot(&self, event: &str) -> bool {
        !self.can(event)
    }

    /// Ticket of the held transition, if any.
    pub fn pending(&self) -> Option<PendingTransition> {
        self.pending.as_ref().map(EventContext::ticket)
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.callbacks
    }

    /// Register a callback, returning the one it replaces.
    pub fn on<F>(&mut self, slot: Slot, callback: F) -> Option<Callback>
    where
        F: Fn(&mut EventContext) -> CallbackResult + Send + Sync + 'static,
    {
        self.callbacks.on(slot, callback)
    }

    pub fn remove_callback(&mut self, slot: &Slot) -> Option<Callback> {
        self.callbacks.remove(slot)
    }

    /// Fire `event` without extras.
    pub fn fire(&mut self, event: &str) -> Result<FireResult, FireError> {
        self.fire_with(event, Extras::new())
    }

    /// Fire `event`, exposing `extras` to every callback of the firing.
    ///
    /// Callbacks run in the order `before`, `leave`, `enter`, `changestate`,
    /// `after`. A `before` callback may cancel; a `leave` callback may hold
    /// the transition, in which case the state is left unchanged until
    /// [`resume_transition`](Self::resume_transition). An event leading back
    /// to the current state only runs `leave` and returns
    /// [`FireResult::Unchanged`].
    ///
    /// If a callback fails during `enter`, `changestate` or `after`, the new
    /// state is already committed: the error carries `committed: true`, the
    /// remaining notifications are skipped and any chained transition is
    /// dropped.
    pub fn fire_with(&mut self, event: &str, extras: Extras) -> Result<FireResult, FireError> {
        let Some(operation) = self.table.operation(event) else {
            return Err(FireError::NoSuchEvent {
                event: event.to_string(),
            });
        };
        let Some(dst) = operation.destination(self.current.as_str()).cloned() else {
            return Err(FireError::InvalidTransition {
                event: event.to_string(),
                from: self.current.clone(),
            });
        };
        if self.status != DispatchStatus::Idle {
            debug!(machine = %self.id, event, status = ?self.status, "rejecting event while busy");
            return Err(FireError::Busy {
                event: event.to_string(),
            });
        }

        let mut ctx = EventContext::new(self.id, event, self.current.clone(), dst, extras);
        debug!(machine = %self.id, event, src = %ctx.src, dst = %ctx.dst, "firing event");

        if ctx.dst == ctx.src {
            return self.stay(ctx);
        }

        if self.run_stage(Stage::Before, &mut ctx, false)? == Verdict::Cancel {
            debug!(machine = %self.id, event, "event cancelled");
            return Ok(FireResult::Cancelled);
        }

        self.status = DispatchStatus::InTransition;
        match self.run_stage(Stage::Leave, &mut ctx, false) {
            Ok(Verdict::Defer) => {
                let ticket = ctx.ticket();
                debug!(machine = %self.id, event, src = %ctx.src, dst = %ctx.dst, "transition held");
                self.status = DispatchStatus::PendingAsync;
                self.pending = Some(ctx);
                Ok(FireResult::Pending(ticket))
            }
            Ok(_) => self.complete(ctx),
            Err(err) => {
                self.status = DispatchStatus::Idle;
                Err(err)
            }
        }
    }

    /// An event whose destination is the current state: `leave` is told,
    /// nothing is committed and its verdict and chain request are dropped.
    fn stay(&mut self, mut ctx: EventContext) -> Result<FireResult, FireError> {
        self.status = DispatchStatus::InTransition;
        let left = self.run_stage(Stage::Leave, &mut ctx, false);
        self.status = DispatchStatus::Idle;

        if let Ok(Verdict::Defer) = left {
            warn!(machine = %self.id, event = %ctx.event, "ignoring hold of a transition to the current state");
        }
        left?;

        debug!(machine = %self.id, event = %ctx.event, state = %ctx.src, "state unchanged");
        Ok(FireResult::Unchanged)
    }

    /// Complete a transition held by a `leave` callback.
    ///
    /// `ticket` must be the one returned with [`FireResult::Pending`].
    pub fn resume_transition(&mut self, ticket: &PendingTransition) -> Result<FireResult, FireError> {
        let ctx = self.take_pending(ticket)?;
        debug!(machine = %self.id, event = %ctx.event, dst = %ctx.dst, "resuming held transition");
        self.status = DispatchStatus::InTransition;
        self.complete(ctx)
    }

    /// Drop a held transition without entering its destination.
    pub fn abandon_transition(&mut self, ticket: &PendingTransition) -> Result<(), FireError> {
        let ctx = self.take_pending(ticket)?;
        debug!(machine = %self.id, event = %ctx.event, "held transition abandoned");
        self.status = DispatchStatus::Idle;
        Ok(())
    }

    fn take_pending(&mut self, ticket: &PendingTransition) -> Result<EventContext, FireError> {
        if self.status != DispatchStatus::PendingAsync {
            return Err(FireError::NotPending);
        }
        match self.pending.take() {
            Some(ctx) if ticket.matches(&ctx) => Ok(ctx),
            Some(ctx) => {
                self.pending = Some(ctx);
                Err(FireError::StaleContext {
                    event: ticket.event.clone(),
                    src: ticket.src.clone(),
                    dst: ticket.dst.clone(),
                })
            }
            None => {
                self.status = DispatchStatus::Idle;
                Err(FireError::NotPending)
            }
        }
    }

    /// Commit, notify, settle, then run any chained transitions.
    fn complete(&mut self, mut ctx: EventContext) -> Result<FireResult, FireError> {
        self.commit(&ctx);
        let notified = self.notify(&mut ctx);
        self.status = DispatchStatus::Idle;
        notified?;

        let mut next = ctx.take_requested_transition();
        while let Some(target) = next {
            next = self.chain(target)?;
        }

        Ok(FireResult::Committed)
    }

    fn chain(&mut self, target: StateName) -> Result<Option<StateName>, FireError> {
        if target.is_none() || !StateName::is_valid_identifier(target.as_str()) {
            warn!(machine = %self.id, target = %target, "invalid chained transition target");
            return Err(FireError::InvalidChainTarget { target });
        }
        if target == self.current {
            debug!(machine = %self.id, target = %target, "chained transition to current state skipped");
            return Ok(None);
        }

        let mut ctx = EventContext::new(
            self.id,
            CHAINED_EVENT,
            self.current.clone(),
            target,
            Extras::new(),
        );
        debug!(machine = %self.id, src = %ctx.src, dst = %ctx.dst, "running chained transition");

        self.status = DispatchStatus::InTransition;
        self.commit(&ctx);
        let notified = self.notify(&mut ctx);
        self.status = DispatchStatus::Idle;
        notified?;

        Ok(ctx.take_requested_transition())
    }

    fn commit(&mut self, ctx: &EventContext) {
        self.current = ctx.dst.clone();
        self.history.push(StateTransition {
            event: ctx.event.clone(),
            from: ctx.src.clone(),
            to: ctx.dst.clone(),
            timestamp: Utc::now(),
        });
        debug!(machine = %self.id, event = %ctx.event, src = %ctx.src, dst = %ctx.dst, "transition committed");
    }

    fn notify(&self, ctx: &mut EventContext) -> Result<(), FireError> {
        for stage in [Stage::Enter, Stage::ChangeState, Stage::After] {
            self.run_stage(stage, ctx, true)?;
        }
        Ok(())
    }

    fn run_stage(
        &self,
        stage: Stage,
        ctx: &mut EventContext,
        committed: bool,
    ) -> Result<Verdict, FireError> {
        let (primary, alias) = stage.slots(ctx);
        let Some((slot, callback)) = self.callbacks.resolve(primary, alias) else {
            return Ok(Verdict::Continue);
        };

        trace!(machine = %self.id, event = %ctx.event, slot = %slot, "invoking callback");
        match callback(ctx) {
            Ok(verdict) if stage.honours(verdict) => Ok(verdict),
            Ok(verdict) => {
                warn!(machine = %self.id, slot = %slot, ?verdict, ?stage, "ignoring verdict");
                Ok(Verdict::Continue)
            }
            Err(source) => {
                warn!(machine = %self.id, slot = %slot, error = %source, committed, "callback failed");
                Err(FireError::CallbackFailed {
                    slot,
                    committed,
                    source,
                })
            }
        }
    }
}
