//! The state machine: stage transitions, gating rules,
//! re-verification triggers, and the confirmation gate. This is the hard
//! part of the system — everything else in the workspace exists to feed
//! events into `BookingOrchestrator::step` and carry out the actions it
//! returns.

use taxi_domain::config::{FareConfig, RetryConfig};
use taxi_domain::contracts::{AddressParser, UkTimeParser};
use taxi_domain::slots::{BookingState, PendingVerification, RetryKey, Stage};
use taxi_domain::trace::TraceEvent;
use taxi_domain::{BackendKind, BackendResult, Event, Intent, NextAction, ToolSync};

use crate::fare;
use crate::patch::Patch;
use crate::retry::{self, RetryOutcome};

// ── Fixed prompt text ────────────────────────────────────────────────
//
// These strings are part of the contract: the confirmation
// readback must never contain closing words, and must always end in an
// explicit yes/no question, because the upstream model is known to
// prematurely emit closing phrases.

const WELCOME: &str = "Welcome! I can help book your taxi today. What is your pickup address?";
const ASK_PICKUP_FIRST: &str = "What is your pickup address?";
const ASK_PICKUP_REPROMPT: &str = "Sorry, I didn't catch that — what is the pickup address?";
const PICKUP_EXHAUSTED: &str = "Pickup address could not be resolved.";

const ASK_DROPOFF_FIRST: &str = "And where are you headed?";
const ASK_DROPOFF_REPROMPT: &str = "Sorry, where would you like to go?";
const DROPOFF_EXHAUSTED: &str = "Destination address could not be resolved.";

const ASK_PASSENGERS_FIRST: &str = "How many passengers will be travelling?";
const ASK_PASSENGERS_REPROMPT: &str = "Sorry, how many passengers — between 1 and 8?";
const PASSENGERS_EXHAUSTED: &str = "Passenger count could not be confirmed.";

const ASK_TIME_FIRST: &str = "When would you like to be picked up?";
const ASK_TIME_REPROMPT: &str = "Sorry, when would you like the pickup — ASAP or a specific time?";
const TIME_EXHAUSTED: &str = "Pickup time could not be confirmed.";

const ASK_HOUSE_NUMBER_FIRST: &str =
    "I have the street, but could you give me the house number too?";
const ASK_HOUSE_NUMBER_REPROMPT: &str = "Sorry, what's the house number for the pickup address?";

const AMEND_MENU_PROMPT: &str =
    "Tell me what you'd like to change: pickup, destination, passengers, or time.";
const AMEND_GOODBYE: &str = "Alright, goodbye.";

/// Per-call deterministic booking orchestrator. Not `Sync`/shared: one
/// instance owns one call's state; no locks live inside it.
pub struct BookingOrchestrator {
    call_id: String,
    state: BookingState,
    retry_config: RetryConfig,
    fare_config: FareConfig,
    time_parser: Box<dyn UkTimeParser>,
    address_parser: Box<dyn AddressParser>,
}

impl BookingOrchestrator {
    pub fn new(
        call_id: impl Into<String>,
        retry_config: RetryConfig,
        fare_config: FareConfig,
        time_parser: Box<dyn UkTimeParser>,
        address_parser: Box<dyn AddressParser>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            state: BookingState::default(),
            retry_config,
            fare_config,
            time_parser,
            address_parser,
        }
    }

    /// Must be called exactly once per call, before any `step`.
    pub fn start(&mut self) -> NextAction {
        self.set_stage(Stage::CollectPickup);
        self.ask_with_retry(
            RetryKey::Pickup,
            WELCOME,
            ASK_PICKUP_REPROMPT,
            PICKUP_EXHAUSTED,
        )
    }

    /// Deterministic transition function. Idempotent for duplicate
    /// `ToolSync` turn IDs.
    pub fn step(&mut self, event: Event) -> NextAction {
        match event {
            Event::ToolSync(tool) => self.step_tool_sync(tool),
            Event::BackendResult(result) => self.step_backend_result(result),
        }
    }

    /// Read-only snapshot for observability and tests.
    pub fn snapshot(&self) -> BookingState {
        self.state.clone()
    }

    // ── Top-level dispatch ────────────────────────────────────────────

    fn step_tool_sync(&mut self, tool: ToolSync) -> NextAction {
        // 1. Idempotency.
        if let Some(turn_id) = tool.turn_id.clone() {
            if self.state.last_turn_id_processed.as_deref() == Some(turn_id.as_str()) {
                TraceEvent::DuplicateTurnDropped {
                    call_id: self.call_id.clone(),
                    turn_id,
                }
                .emit();
                return NextAction::None {
                    reason: "duplicate".into(),
                };
            }
            self.state.last_turn_id_processed = Some(turn_id);
        }

        // 2. Terminal stages.
        if self.state.stage.is_terminal() {
            return NextAction::Hangup {
                text: "call complete".into(),
            };
        }

        let patch = Patch::from(&tool, &self.state.slots, self.time_parser.as_ref());
        let distance_hint = tool.distance_hint_meters;

        // 3. Amend routing.
        if self.state.stage.is_amend_flow() {
            return self.amend_flow(patch, distance_hint);
        }

        // 4. Confirm gate.
        if self.state.stage == Stage::ConfirmDetails {
            return self.confirm_gate(patch, distance_hint);
        }

        // 5. Collection flow.
        self.collection_flow(patch, distance_hint)
    }

    fn step_backend_result(&mut self, result: BackendResult) -> NextAction {
        if self.state.stage.is_terminal() {
            return NextAction::Hangup {
                text: "call complete".into(),
            };
        }
        match result.kind {
            BackendKind::GeocodePickup => self.handle_geocode_result(true, result),
            BackendKind::GeocodeDropoff => self.handle_geocode_result(false, result),
            BackendKind::Dispatch => self.handle_dispatch_result(result),
            BackendKind::Amend => self.handle_amend_result(result),
        }
    }

    // ── 4.E.i Start is above; 4.E.ii Collection flow ───────────────────

    fn collection_flow(&mut self, patch: Patch, distance_hint: Option<f64>) -> NextAction {
        self.apply_patch(&patch);

        if patch.pickup_changed {
            self.state.retries.reset(RetryKey::PickupVerify);
            self.state.pending_verification = PendingVerification::Pickup;
            self.set_stage(Stage::CollectPickup);
            let raw = self.state.slots.pickup.raw.clone().expect("just set");
            return NextAction::GeocodePickup { raw };
        }
        if patch.dropoff_changed {
            self.state.retries.reset(RetryKey::DropoffVerify);
            self.state.pending_verification = PendingVerification::Dropoff;
            self.set_stage(Stage::CollectDropoff);
            let raw = self.state.slots.dropoff.raw.clone().expect("just set");
            return NextAction::GeocodeDropoff { raw };
        }

        self.dispatch_on_stage(distance_hint)
    }

    fn dispatch_on_stage(&mut self, distance_hint: Option<f64>) -> NextAction {
        match self.state.stage {
            Stage::CollectPickup => self.handle_collect_pickup(),
            Stage::CollectDropoff => self.handle_collect_dropoff(),
            Stage::CollectPassengers => self.handle_collect_passengers(distance_hint),
            Stage::CollectTime => self.handle_collect_time(distance_hint),
            _ => self.go_to_next_missing_or_confirm(distance_hint),
        }
    }

    fn handle_collect_pickup(&mut self) -> NextAction {
        if !self.state.slots.pickup.is_present() {
            return self.ask_with_retry(
                RetryKey::Pickup,
                ASK_PICKUP_FIRST,
                ASK_PICKUP_REPROMPT,
                PICKUP_EXHAUSTED,
            );
        }
        self.state.pending_verification = PendingVerification::Pickup;
        let raw = self.state.slots.pickup.raw.clone().expect("present");
        NextAction::GeocodePickup { raw }
    }

    fn handle_collect_dropoff(&mut self) -> NextAction {
        if !self.state.slots.dropoff.is_present() {
            return self.ask_with_retry(
                RetryKey::Dropoff,
                ASK_DROPOFF_FIRST,
                ASK_DROPOFF_REPROMPT,
                DROPOFF_EXHAUSTED,
            );
        }
        self.state.pending_verification = PendingVerification::Dropoff;
        let raw = self.state.slots.dropoff.raw.clone().expect("present");
        NextAction::GeocodeDropoff { raw }
    }

    fn handle_collect_passengers(&mut self, distance_hint: Option<f64>) -> NextAction {
        if !self.state.slots.dropoff.verified {
            // Prevents "stuck on passengers after a destination correction".
            self.set_stage(Stage::CollectDropoff);
            return self.handle_collect_dropoff();
        }
        if self.state.slots.passengers_valid().is_some() {
            return self.go_to_next_missing_or_confirm(distance_hint);
        }
        self.ask_with_retry(
            RetryKey::Passengers,
            ASK_PASSENGERS_FIRST,
            ASK_PASSENGERS_REPROMPT,
            PASSENGERS_EXHAUSTED,
        )
    }

    fn handle_collect_time(&mut self, distance_hint: Option<f64>) -> NextAction {
        if self.state.slots.pickup_time.is_some() {
            return self.go_to_next_missing_or_confirm(distance_hint);
        }
        self.ask_with_retry(
            RetryKey::Time,
            ASK_TIME_FIRST,
            ASK_TIME_REPROMPT,
            TIME_EXHAUSTED,
        )
    }

    /// Walk pickup → dropoff → passengers → time in order, jumping to the
    /// first unsatisfied step; once all are satisfied, build the readback
    /// and move to `ConfirmDetails`.
    fn go_to_next_missing_or_confirm(&mut self, distance_hint: Option<f64>) -> NextAction {
        if !self.state.slots.pickup.is_present() {
            self.set_stage(Stage::CollectPickup);
            return self.ask_with_retry(
                RetryKey::Pickup,
                ASK_PICKUP_FIRST,
                ASK_PICKUP_REPROMPT,
                PICKUP_EXHAUSTED,
            );
        }
        if !self.state.slots.pickup.verified {
            self.set_stage(Stage::CollectPickup);
            self.state.pending_verification = PendingVerification::Pickup;
            let raw = self.state.slots.pickup.raw.clone().expect("present");
            return NextAction::GeocodePickup { raw };
        }
        if !self.state.slots.dropoff.is_present() {
            self.set_stage(Stage::CollectDropoff);
            return self.ask_with_retry(
                RetryKey::Dropoff,
                ASK_DROPOFF_FIRST,
                ASK_DROPOFF_REPROMPT,
                DROPOFF_EXHAUSTED,
            );
        }
        if !self.state.slots.dropoff.verified {
            self.set_stage(Stage::CollectDropoff);
            self.state.pending_verification = PendingVerification::Dropoff;
            let raw = self.state.slots.dropoff.raw.clone().expect("present");
            return NextAction::GeocodeDropoff { raw };
        }
        if self.state.slots.passengers_valid().is_none() {
            self.set_stage(Stage::CollectPassengers);
            return self.ask_with_retry(
                RetryKey::Passengers,
                ASK_PASSENGERS_FIRST,
                ASK_PASSENGERS_REPROMPT,
                PASSENGERS_EXHAUSTED,
            );
        }
        if self.state.slots.pickup_time.is_none() {
            self.set_stage(Stage::CollectTime);
            return self.ask_with_retry(
                RetryKey::Time,
                ASK_TIME_FIRST,
                ASK_TIME_REPROMPT,
                TIME_EXHAUSTED,
            );
        }

        self.ensure_fare_quote(distance_hint);
        self.set_stage(Stage::ConfirmDetails);
        let text = build_readback(&self.state.slots);
        self.state.last_prompt = Some(text.clone());
        NextAction::Ask { text }
    }

    // ── 4.E.iii Confirm gate ────────────────────────────────────────────

    fn confirm_gate(&mut self, patch: Patch, distance_hint: Option<f64>) -> NextAction {
        match patch.intent {
            Intent::Confirm => {
                self.set_stage(Stage::Dispatching);
                TraceEvent::BackendDispatched {
                    call_id: self.call_id.clone(),
                    kind: "dispatch".into(),
                }
                .emit();
                return NextAction::Dispatch {
                    slots: self.state.slots.clone(),
                };
            }
            Intent::Decline | Intent::Cancel => {
                self.set_stage(Stage::End);
                return NextAction::Hangup {
                    text: "No problem. Goodbye.".into(),
                };
            }
            _ => {}
        }

        if patch.has_any_slot_changes() {
            self.apply_patch(&patch);
            if patch.pickup_changed {
                self.state.retries.reset(RetryKey::PickupVerify);
                self.state.pending_verification = PendingVerification::Pickup;
                self.set_stage(Stage::CollectPickup);
                let raw = self.state.slots.pickup.raw.clone().expect("just set");
                return NextAction::GeocodePickup { raw };
            }
            if patch.dropoff_changed {
                self.state.retries.reset(RetryKey::DropoffVerify);
                self.state.pending_verification = PendingVerification::Dropoff;
                self.set_stage(Stage::CollectDropoff);
                let raw = self.state.slots.dropoff.raw.clone().expect("just set");
                return NextAction::GeocodeDropoff { raw };
            }
            return self.go_to_next_missing_or_confirm(distance_hint);
        }

        // Confirmation is never inferred from slot changes; with no changes
        // and no confirm/decline/cancel intent, the ask is ambiguous.
        match retry::increment(&mut self.state.retries, &self.retry_config, RetryKey::Confirm) {
            RetryOutcome::Exceeded => {
                self.set_stage(Stage::Escalate);
                let reason = "Confirmation unclear too many times.".to_string();
                TraceEvent::Escalated {
                    call_id: self.call_id.clone(),
                    reason: reason.clone(),
                }
                .emit();
                NextAction::TransferToHuman { reason }
            }
            RetryOutcome::Within(_) => {
                let text = self
                    .state
                    .last_prompt
                    .clone()
                    .unwrap_or_else(|| build_readback(&self.state.slots));
                NextAction::Ask { text }
            }
        }
    }

    // ── 4.E.iv Amend flow ────────────────────────────────────────────────

    fn amend_flow(&mut self, patch: Patch, distance_hint: Option<f64>) -> NextAction {
        if self.state.booking_id.is_none() {
            // Caller is apparently still pre-booking.
            return self.collection_flow(patch, distance_hint);
        }

        if patch.intent == Intent::Cancel {
            self.set_stage(Stage::End);
            return NextAction::Hangup {
                text: "Okay. Goodbye.".into(),
            };
        }

        if !patch.has_any_slot_changes() {
            if patch.intent == Intent::Decline {
                self.set_stage(Stage::End);
                return NextAction::Hangup {
                    text: AMEND_GOODBYE.into(),
                };
            }
            return match retry::increment(&mut self.state.retries, &self.retry_config, RetryKey::AmendMenu)
            {
                RetryOutcome::Exceeded => {
                    self.set_stage(Stage::End);
                    NextAction::Hangup {
                        text: AMEND_GOODBYE.into(),
                    }
                }
                RetryOutcome::Within(_) => {
                    self.set_stage(Stage::AmendMenu);
                    let text = AMEND_MENU_PROMPT.to_string();
                    self.state.last_prompt = Some(text.clone());
                    NextAction::Ask { text }
                }
            };
        }

        self.apply_patch(&patch);
        if patch.pickup_changed {
            self.state.retries.reset(RetryKey::PickupVerify);
            self.state.pending_verification = PendingVerification::Pickup;
            self.set_stage(Stage::AmendCollectPickup);
            let raw = self.state.slots.pickup.raw.clone().expect("just set");
            return NextAction::GeocodePickup { raw };
        }
        if patch.dropoff_changed {
            self.state.retries.reset(RetryKey::DropoffVerify);
            self.state.pending_verification = PendingVerification::Dropoff;
            self.set_stage(Stage::AmendCollectDropoff);
            let raw = self.state.slots.dropoff.raw.clone().expect("just set");
            return NextAction::GeocodeDropoff { raw };
        }

        // No address changed: dispatch the amendment directly. `AmendConfirm`
        // here plays the same role `Dispatching` plays in the main flow — a
        // parked stage awaiting exactly one matching `BackendResult`, not a
        // second yes/no confirmation (see DESIGN.md for why this departs
        // from a literal reading of the amend readback question).
        self.set_stage(Stage::AmendConfirm);
        let booking_id = self.state.booking_id.clone().expect("checked above");
        TraceEvent::BackendDispatched {
            call_id: self.call_id.clone(),
            kind: "amend".into(),
        }
        .emit();
        NextAction::Amend {
            booking_id,
            slots: self.state.slots.clone(),
        }
    }

    // ── 4.E.v Backend result handling ────────────────────────────────────

    fn handle_geocode_result(&mut self, is_pickup: bool, result: BackendResult) -> NextAction {
        let expected = if is_pickup {
            PendingVerification::Pickup
        } else {
            PendingVerification::Dropoff
        };
        if self.state.pending_verification != expected {
            return NextAction::None {
                reason: "stale backend result".into(),
            };
        }
        self.state.pending_verification = PendingVerification::None;

        if result.ok {
            let which = if is_pickup { "pickup" } else { "dropoff" };
            let slot = if is_pickup {
                &mut self.state.slots.pickup
            } else {
                &mut self.state.slots.dropoff
            };
            slot.mark_verified(result.normalized_address.clone());
            TraceEvent::AddressVerified {
                call_id: self.call_id.clone(),
                which: which.into(),
                normalized: slot.normalized.clone().unwrap_or_default(),
            }
            .emit();

            if is_pickup {
                if let Some(reprompt) = self.check_house_number_clarification() {
                    return reprompt;
                }
            }

            return if self.state.stage.is_amend_flow() {
                self.amend_continue_after_verify()
            } else {
                self.go_to_next_missing_or_confirm(None)
            };
        }

        let key = if is_pickup {
            RetryKey::PickupVerify
        } else {
            RetryKey::DropoffVerify
        };
        TraceEvent::AddressVerificationFailed {
            call_id: self.call_id.clone(),
            which: if is_pickup { "pickup" } else { "dropoff" }.into(),
            attempt: self.state.retries.get(key) + 1,
        }
        .emit();

        match retry::increment(&mut self.state.retries, &self.retry_config, key) {
            RetryOutcome::Exceeded => {
                self.set_stage(Stage::Escalate);
                let reason = if is_pickup {
                    PICKUP_EXHAUSTED
                } else {
                    DROPOFF_EXHAUSTED
                }
                .to_string();
                TraceEvent::Escalated {
                    call_id: self.call_id.clone(),
                    reason: reason.clone(),
                }
                .emit();
                NextAction::TransferToHuman { reason }
            }
            RetryOutcome::Within(_) => {
                // Raw is retained so the caller can correct a single component.
                let text = if is_pickup {
                    "I couldn't verify that pickup address — could you repeat it, maybe with more detail?"
                } else {
                    "I couldn't verify that destination — could you repeat it, maybe with more detail?"
                }
                .to_string();
                self.state.last_prompt = Some(text.clone());
                NextAction::Ask { text }
            }
        }
    }

    /// Check whether the pickup's raw address is a street-type address
    /// missing a house number, and if so, return a clarifying reprompt.
    fn check_house_number_clarification(&mut self) -> Option<NextAction> {
        let raw = self.state.slots.pickup.raw.clone()?;
        let parsed = self.address_parser.parse(&raw);
        if parsed.is_street_type && !parsed.has_house_number {
            Some(self.ask_with_retry(
                RetryKey::Pickup,
                ASK_HOUSE_NUMBER_FIRST,
                ASK_HOUSE_NUMBER_REPROMPT,
                PICKUP_EXHAUSTED,
            ))
        } else {
            None
        }
    }

    fn amend_continue_after_verify(&mut self) -> NextAction {
        self.set_stage(Stage::AmendConfirm);
        let booking_id = self.state.booking_id.clone().expect("amend flow implies booking_id");
        TraceEvent::BackendDispatched {
            call_id: self.call_id.clone(),
            kind: "amend".into(),
        }
        .emit();
        NextAction::Amend {
            booking_id,
            slots: self.state.slots.clone(),
        }
    }

    fn handle_dispatch_result(&mut self, result: BackendResult) -> NextAction {
        if self.state.stage != Stage::Dispatching {
            return NextAction::None {
                reason: "stale dispatch result".into(),
            };
        }
        if result.ok {
            let id = result.booking_id.clone().unwrap_or_default();
            self.state.booking_id = Some(id.clone());
            self.set_stage(Stage::Booked);
            TraceEvent::BookingConfirmed {
                call_id: self.call_id.clone(),
                booking_id: id.clone(),
            }
            .emit();
            let text =
                format!("Booked. Your reference is {id}. Would you like to amend anything?");
            self.state.last_prompt = Some(text.clone());
            NextAction::Ask { text }
        } else {
            self.set_stage(Stage::Escalate);
            let reason = "Dispatch failed.".to_string();
            TraceEvent::Escalated {
                call_id: self.call_id.clone(),
                reason: reason.clone(),
            }
            .emit();
            NextAction::TransferToHuman { reason }
        }
    }

    fn handle_amend_result(&mut self, result: BackendResult) -> NextAction {
        if self.state.stage != Stage::AmendConfirm {
            return NextAction::None {
                reason: "stale amend result".into(),
            };
        }
        if result.ok {
            self.set_stage(Stage::Booked);
            let text =
                "Updated. Your booking has been amended. Would you like to change anything else?"
                    .to_string();
            self.state.last_prompt = Some(text.clone());
            NextAction::Ask { text }
        } else {
            self.set_stage(Stage::Escalate);
            let reason = "Amendment failed.".to_string();
            TraceEvent::Escalated {
                call_id: self.call_id.clone(),
                reason: reason.clone(),
            }
            .emit();
            NextAction::TransferToHuman { reason }
        }
    }

    // ── 4.E.vi Ask-with-retry helper ─────────────────────────────────────

    fn ask_with_retry(
        &mut self,
        key: RetryKey,
        first_ask: &str,
        reprompt: &str,
        exhausted_reason: &str,
    ) -> NextAction {
        let counter = self.state.retries.get(key);
        if counter == 0 {
            self.state.retries.increment(key);
            self.state.last_prompt = Some(first_ask.to_string());
            return NextAction::Ask {
                text: first_ask.to_string(),
            };
        }

        let new_count = self.state.retries.increment(key);
        let cap = self.retry_config.cap(key);
        TraceEvent::RetryIncremented {
            call_id: self.call_id.clone(),
            key: key.as_str().into(),
            count: new_count,
            cap,
        }
        .emit();

        if new_count > cap {
            self.set_stage(Stage::Escalate);
            let reason = exhausted_reason.to_string();
            TraceEvent::Escalated {
                call_id: self.call_id.clone(),
                reason: reason.clone(),
            }
            .emit();
            NextAction::TransferToHuman { reason }
        } else {
            self.state.last_prompt = Some(reprompt.to_string());
            NextAction::Ask {
                text: reprompt.to_string(),
            }
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────

    fn apply_patch(&mut self, patch: &Patch) {
        if patch.pickup_changed {
            if let Some(raw) = &patch.pickup_raw {
                self.state.slots.pickup.set_raw(raw.clone());
            }
        }
        if patch.dropoff_changed {
            if let Some(raw) = &patch.dropoff_raw {
                self.state.slots.dropoff.set_raw(raw.clone());
            }
        }
        if patch.passengers_changed {
            self.state.slots.passengers = patch.passengers;
        }
        if patch.time_changed {
            self.state.slots.pickup_time = patch.pickup_time.clone();
        }
        if let Some(instructions) = &patch.special_instructions {
            self.state.slots.special_instructions = Some(instructions.clone());
        }
    }

    fn ensure_fare_quote(&mut self, distance_hint: Option<f64>) {
        if distance_hint.is_some() {
            self.state.slots.fare_quote = Some(fare::estimate(distance_hint, &self.fare_config));
        } else if self.state.slots.fare_quote.is_none() {
            self.state.slots.fare_quote = Some(fare::estimate(None, &self.fare_config));
        }
        if let Some(quote) = &self.state.slots.fare_quote {
            TraceEvent::FareQuoted {
                call_id: self.call_id.clone(),
                amount_minor_units: quote.amount_minor_units,
                currency: quote.currency.clone(),
                basis: quote.basis.clone(),
            }
            .emit();
        }
    }

    /// The retry key tied to a collection stage, reset whenever the flow
    /// pivots away from it.
    fn stage_retry_key(stage: Stage) -> Option<RetryKey> {
        match stage {
            Stage::CollectPickup | Stage::AmendCollectPickup => Some(RetryKey::Pickup),
            Stage::CollectDropoff | Stage::AmendCollectDropoff => Some(RetryKey::Dropoff),
            Stage::CollectPassengers | Stage::AmendCollectPassengers => {
                Some(RetryKey::Passengers)
            }
            Stage::CollectTime | Stage::AmendCollectTime => Some(RetryKey::Time),
            Stage::ConfirmDetails => Some(RetryKey::Confirm),
            Stage::AmendConfirm => Some(RetryKey::Confirm),
            _ => None,
        }
    }

    fn set_stage(&mut self, new_stage: Stage) {
        if self.state.stage == new_stage {
            return;
        }
        if let Some(key) = Self::stage_retry_key(self.state.stage) {
            self.state.retries.reset(key);
        }
        TraceEvent::StageTransition {
            call_id: self.call_id.clone(),
            from: format!("{:?}", self.state.stage),
            to: format!("{:?}", new_stage),
        }
        .emit();
        self.state.stage = new_stage;
    }
}

/// Build the confirmation/amend readback. Must list pickup, dropoff,
/// passengers, and time exactly as stored, and end in an explicit yes/no
/// question — never a closing phrase.
fn build_readback(slots: &taxi_domain::slots::BookingSlots) -> String {
    let pickup = slots
        .pickup
        .normalized
        .as_deref()
        .or(slots.pickup.raw.as_deref())
        .unwrap_or("(not given)");
    let dropoff = slots
        .dropoff
        .normalized
        .as_deref()
        .or(slots.dropoff.raw.as_deref())
        .unwrap_or("(not given)");
    let passengers = match slots.passengers {
        Some(1) => "1 passenger".to_string(),
        Some(n) => format!("{n} passengers"),
        None => "no passenger count".to_string(),
    };
    let time = match &slots.pickup_time {
        Some(t) if t.is_asap => "ASAP".to_string(),
        Some(t) => t.raw.clone(),
        None => "no pickup time".to_string(),
    };
    let fare = match &slots.fare_quote {
        Some(q) => format!(
            "{:.2} {}",
            q.amount_minor_units as f64 / 100.0,
            q.currency
        ),
        None => "to be confirmed".to_string(),
    };

    format!(
        "To confirm: pickup at {pickup}, going to {dropoff}, for {passengers}, pickup time {time}, estimated fare {fare}. Shall I go ahead and book this — yes or no?"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readback_never_contains_closing_words() {
        let mut slots = taxi_domain::slots::BookingSlots::default();
        slots.pickup.set_raw("10 High St".into());
        slots.pickup.mark_verified(Some("10 High St, AB1 2CD".into()));
        slots.dropoff.set_raw("Main Square".into());
        slots
            .dropoff
            .mark_verified(Some("Main Square, AB1 3EF".into()));
        slots.passengers = Some(2);
        slots.pickup_time = Some(taxi_domain::slots::PickupTime::asap("ASAP"));
        slots.fare_quote = Some(taxi_domain::slots::FareQuote {
            amount_minor_units: 1240,
            currency: "GBP".into(),
            basis: "distance".into(),
        });

        let text = build_readback(&slots);
        for banned in ["booked", "arranged", "safe travels", "see you soon"] {
            assert!(
                !text.to_lowercase().contains(banned),
                "readback should not contain closing word {banned:?}: {text}"
            );
        }
        assert!(text.contains("10 High St, AB1 2CD"));
        assert!(text.contains("Main Square, AB1 3EF"));
        assert!(text.contains("2 passengers"));
        assert!(text.contains("ASAP"));
        assert!(text.ends_with("yes or no?"));
    }
}
