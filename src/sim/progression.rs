//! Progression state machine
//!
//! `step` is a total function from (snapshot, event) to the next snapshot.
//! Events that do not apply to the current snapshot (interacting with a
//! locked box, answering with nothing open) leave it unchanged. `Progression`
//! owns the current snapshot, swaps it wholesale after each event and
//! persists it through a `SaveStore`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::layout::generate_layout;
use super::state::{GameState, ObjectiveId};
use crate::persistence::{SaveRecord, SaveStore};
use crate::questions::{Question, QuestionBank};
use crate::settings::{LayoutSettings, ProgressionSettings, Settings};

/// Everything that can happen to the progression
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Avatar's new ground-plane position
    MovePlayer { x: f32, z: f32 },
    /// Avatar reached an objective
    Interact(ObjectiveId),
    /// Option chosen for the open question
    Answer(usize),
    CloseQuestion,
    ToggleHints,
    /// New questions, new layout, fresh player, save cleared
    Reset,
}

/// What happened to an answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub objective: ObjectiveId,
    pub correct: bool,
    /// Attempts used including this one
    pub attempts: u32,
    /// Outcome is final: the objective is now completed
    pub resolved: bool,
    pub coins_awarded: u32,
    pub xp_awarded: u32,
    /// Objective unlocked by this resolution
    pub unlocked: Option<ObjectiveId>,
}

/// Result of applying one event
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: GameState,
    pub outcome: Option<AnswerOutcome>,
}

impl Transition {
    fn unchanged(state: &GameState) -> Self {
        Self {
            state: state.clone(),
            outcome: None,
        }
    }

    fn to(state: GameState) -> Self {
        Self {
            state,
            outcome: None,
        }
    }
}

/// Initial snapshot for a set of questions
pub fn initialize<R: Rng + ?Sized>(
    questions: Vec<Question>,
    rng: &mut R,
    layout: &LayoutSettings,
) -> GameState {
    GameState::from_objectives(generate_layout(questions, rng, layout).objectives)
}

/// Apply one event. `Reset` needs fresh questions and is handled by
/// `Progression`; here it leaves the snapshot unchanged.
pub fn step(state: &GameState, event: &GameEvent, rules: &ProgressionSettings) -> Transition {
    match event {
        GameEvent::MovePlayer { x, z } => {
            let mut next = state.clone();
            next.player.position = Vec2::new(*x, *z);
            Transition::to(next)
        }
        GameEvent::Interact(id) => interact(state, id),
        GameEvent::Answer(option) => answer(state, *option, rules),
        GameEvent::CloseQuestion => {
            let mut next = state.clone();
            next.open = None;
            next.attempts = 0;
            Transition::to(next)
        }
        GameEvent::ToggleHints => {
            let mut next = state.clone();
            next.hints_enabled = !next.hints_enabled;
            Transition::to(next)
        }
        GameEvent::Reset => Transition::unchanged(state),
    }
}

fn interact(state: &GameState, id: &ObjectiveId) -> Transition {
    let Some(objective) = state.objective(id) else {
        return Transition::unchanged(state);
    };
    // Re-entering the open box must not refill its attempts
    if !objective.is_open_for_play() || state.open.as_ref() == Some(id) {
        return Transition::unchanged(state);
    }

    let mut next = state.clone();
    next.open = Some(id.clone());
    next.attempts = 0;
    Transition::to(next)
}

fn answer(state: &GameState, option: usize, rules: &ProgressionSettings) -> Transition {
    let Some(open_id) = state.open.as_ref() else {
        return Transition::unchanged(state);
    };
    let Some(index) = state.objective_index(open_id) else {
        return Transition::unchanged(state);
    };
    let objective = &state.objectives[index];
    // Already resolved; waiting for the question to be closed
    if objective.completed {
        return Transition::unchanged(state);
    }

    let correct = objective.question.is_correct(option);
    let attempts = state.attempts + 1;
    let resolved = correct || attempts >= rules.max_attempts;

    let mut next = state.clone();
    next.attempts = attempts;

    let mut outcome = AnswerOutcome {
        objective: open_id.clone(),
        correct,
        attempts,
        resolved,
        coins_awarded: 0,
        xp_awarded: 0,
        unlocked: None,
    };

    if resolved {
        let coins = if correct { objective.reward } else { 0 };
        let xp = if correct {
            rules.xp_correct
        } else {
            rules.xp_exhausted
        };

        next.objectives[index].completed = true;
        next.player.coins = next.player.coins.saturating_add(coins);
        next.player.xp = next.player.xp.saturating_add(xp);
        next.player.completed.push(open_id.clone());

        if let Some(following) = next.objectives.get_mut(index + 1) {
            if !following.unlocked {
                following.unlocked = true;
                outcome.unlocked = Some(following.id.clone());
            }
        }

        outcome.coins_awarded = coins;
        outcome.xp_awarded = xp;
        log::info!(
            "{} resolved ({}) after {} attempt(s): +{} coins, +{} xp",
            open_id,
            if correct { "correct" } else { "attempts exhausted" },
            attempts,
            coins,
            xp
        );
    }

    Transition {
        state: next,
        outcome: Some(outcome),
    }
}

/// Owner of the live snapshot
pub struct Progression<S: SaveStore> {
    state: GameState,
    settings: Settings,
    bank: QuestionBank,
    rng: Pcg32,
    store: S,
    /// Bumped whenever a new snapshot is published
    revision: u64,
    layout_relaxed: bool,
}

impl<S: SaveStore> Progression<S> {
    /// Start a run and restore any saved progress onto it
    pub fn new(bank: QuestionBank, settings: Settings, seed: u64, store: S) -> Self {
        if let Err(e) = settings.validate() {
            log::warn!("Starting with {}", e);
        }
        let mut progression = Self {
            state: GameState::from_objectives(Vec::new()),
            settings,
            bank,
            rng: Pcg32::seed_from_u64(seed),
            store,
            revision: 0,
            layout_relaxed: false,
        };
        progression.state = progression.fresh_state();
        progression.restore();
        progression
    }

    /// Latest published snapshot
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the current layout had to relax objective spacing
    pub fn layout_relaxed(&self) -> bool {
        self.layout_relaxed
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply an event, publish the result and persist it
    pub fn dispatch(&mut self, event: GameEvent) -> Option<AnswerOutcome> {
        if event == GameEvent::Reset {
            self.reset();
            return None;
        }

        let Transition { state, outcome } = step(&self.state, &event, &self.settings.progression);
        if state == self.state {
            log::trace!("Ignored {:?}", event);
            return outcome;
        }

        debug_assert!(
            state.check_invariants().is_ok(),
            "{:?} broke an invariant: {:?}",
            event,
            state.check_invariants()
        );
        self.publish(state);
        self.persist();
        outcome
    }

    /// Discard all progress and start over with new questions
    pub fn reset(&mut self) {
        let state = self.fresh_state();
        self.publish(state);
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear saved game: {}", e);
        }
        log::info!("Game reset");
    }

    /// Write the persistent part of the snapshot. Failures are logged only.
    pub fn persist(&mut self) {
        let record = SaveRecord::from_state(&self.state);
        if let Err(e) = self.store.save(&record) {
            log::warn!("Failed to save game: {}", e);
        }
    }

    /// Overlay saved progress onto the current snapshot. Returns true if a
    /// save was applied; malformed data is logged and ignored.
    pub fn restore(&mut self) -> bool {
        match self.store.load() {
            Ok(Some(record)) => {
                let state = record.apply_to(&self.state);
                log::info!(
                    "Restored save: {} coins, {} xp, {} completed",
                    state.player.coins,
                    state.player.xp,
                    state.player.completed.len()
                );
                self.publish(state);
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::error!("Failed to load saved game: {}", e);
                false
            }
        }
    }

    fn fresh_state(&mut self) -> GameState {
        let questions = self
            .bank
            .sample(&mut self.rng, self.settings.progression.objective_count);
        let layout = generate_layout(questions, &mut self.rng, &self.settings.layout);
        if layout.relaxed {
            log::warn!(
                "Objective spacing relaxed to {}",
                layout.effective_separation
            );
        }
        self.layout_relaxed = layout.relaxed;
        GameState::from_objectives(layout.objectives)
    }

    fn publish(&mut self, state: GameState) {
        self.state = state;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    fn rules() -> ProgressionSettings {
        ProgressionSettings::default()
    }

    fn fresh() -> GameState {
        let mut rng = Pcg32::seed_from_u64(2024);
        let questions = QuestionBank::standard().sample(&mut rng, 8);
        initialize(questions, &mut rng, &LayoutSettings::default())
    }

    fn apply(state: &GameState, event: GameEvent) -> Transition {
        step(state, &event, &rules())
    }

    fn wrong_option(state: &GameState) -> usize {
        let q = state.current_question().expect("question open");
        (q.correct_option + 1) % q.options.len()
    }

    fn right_option(state: &GameState) -> usize {
        state.current_question().expect("question open").correct_option
    }

    fn open_first(state: &GameState) -> GameState {
        apply(state, GameEvent::Interact(ObjectiveId::for_index(0))).state
    }

    #[test]
    fn test_initial_snapshot() {
        let state = fresh();
        assert_eq!(state.player.coins, 0);
        assert_eq!(state.player.xp, 0);
        assert_eq!(state.player.level, 1);
        assert!(state.player.completed.is_empty());
        assert!(state.hints_enabled);
        assert!(state.open.is_none());
        assert_eq!(state.attempts, 0);
        let unlocked: Vec<_> = state.objectives.iter().filter(|o| o.unlocked).collect();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, ObjectiveId::for_index(0));
    }

    #[test]
    fn test_move_only_touches_position() {
        let state = fresh();
        let next = apply(&state, GameEvent::MovePlayer { x: 3.0, z: -4.0 }).state;
        assert_eq!(next.player.position, Vec2::new(3.0, -4.0));
        assert_eq!(next.objectives, state.objectives);
        assert_eq!(next.player.coins, state.player.coins);
    }

    #[test]
    fn test_interact_opens_unlocked() {
        let state = open_first(&fresh());
        assert_eq!(state.open, Some(ObjectiveId::for_index(0)));
        assert_eq!(state.attempts, 0);
    }

    #[test]
    fn test_interact_ignores_locked_and_unknown() {
        let state = fresh();
        let locked = apply(&state, GameEvent::Interact(ObjectiveId::for_index(1)));
        assert_eq!(locked.state, state);
        let unknown = apply(&state, GameEvent::Interact("box_404".into()));
        assert_eq!(unknown.state, state);
    }

    #[test]
    fn test_interact_ignores_completed() {
        let state = open_first(&fresh());
        let answered = apply(&state, GameEvent::Answer(right_option(&state))).state;
        let closed = apply(&answered, GameEvent::CloseQuestion).state;
        let again = apply(&closed, GameEvent::Interact(ObjectiveId::for_index(0))).state;
        assert_eq!(again, closed);
    }

    #[test]
    fn test_reinteract_keeps_attempts() {
        let state = open_first(&fresh());
        let after_wrong = apply(&state, GameEvent::Answer(wrong_option(&state))).state;
        assert_eq!(after_wrong.attempts, 1);
        let again = apply(&after_wrong, GameEvent::Interact(ObjectiveId::for_index(0))).state;
        assert_eq!(again.attempts, 1);
    }

    #[test]
    fn test_answer_without_open_question_is_noop() {
        let state = fresh();
        let t = apply(&state, GameEvent::Answer(0));
        assert_eq!(t.state, state);
        assert!(t.outcome.is_none());
    }

    #[test]
    fn test_correct_first_attempt() {
        let state = open_first(&fresh());
        let t = apply(&state, GameEvent::Answer(right_option(&state)));
        let next = t.state;

        assert_eq!(next.player.coins, 75);
        assert_eq!(next.player.xp, 100);
        assert!(next.objectives[0].completed);
        assert!(next.objectives[1].unlocked);
        assert!(!next.objectives[2].unlocked);
        assert_eq!(next.player.completed, vec![ObjectiveId::for_index(0)]);

        let outcome = t.outcome.unwrap();
        assert!(outcome.correct && outcome.resolved);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.coins_awarded, 75);
        assert_eq!(outcome.unlocked, Some(ObjectiveId::for_index(1)));
    }

    #[test]
    fn test_wrong_with_attempts_left() {
        let state = open_first(&fresh());
        let t = apply(&state, GameEvent::Answer(wrong_option(&state)));
        let next = t.state;
        assert_eq!(next.attempts, 1);
        assert_eq!(next.open, Some(ObjectiveId::for_index(0)));
        assert!(!next.objectives[0].completed);
        assert!(next.player.completed.is_empty());
        assert_eq!(next.player.xp, 0);

        let outcome = t.outcome.unwrap();
        assert!(!outcome.correct && !outcome.resolved);
        assert_eq!(outcome.xp_awarded, 0);
    }

    #[test]
    fn test_attempts_exhausted() {
        let mut state = open_first(&fresh());
        for _ in 0..3 {
            state = apply(&state, GameEvent::Answer(wrong_option(&state))).state;
        }
        assert!(state.objectives[0].completed);
        assert!(state.objectives[1].unlocked);
        assert_eq!(state.player.coins, 0);
        assert_eq!(state.player.xp, 25);
        assert_eq!(state.player.completed, vec![ObjectiveId::for_index(0)]);
        assert_eq!(state.attempts, 3);
    }

    #[test]
    fn test_correct_on_last_attempt_pays_reward() {
        let mut state = open_first(&fresh());
        for _ in 0..2 {
            state = apply(&state, GameEvent::Answer(wrong_option(&state))).state;
        }
        state = apply(&state, GameEvent::Answer(right_option(&state))).state;
        assert_eq!(state.player.coins, 75);
        assert_eq!(state.player.xp, 100);
    }

    #[test]
    fn test_answer_after_resolution_is_noop() {
        let state = open_first(&fresh());
        let resolved = apply(&state, GameEvent::Answer(right_option(&state))).state;
        let t = apply(&resolved, GameEvent::Answer(right_option(&resolved)));
        assert_eq!(t.state, resolved);
        assert!(t.outcome.is_none());
        assert_eq!(t.state.player.coins, 75);
    }

    #[test]
    fn test_last_objective_unlocks_nothing() {
        let mut state = fresh();
        for i in 0..state.objectives.len() {
            state = apply(&state, GameEvent::Interact(ObjectiveId::for_index(i))).state;
            let t = apply(&state, GameEvent::Answer(right_option(&state)));
            state = apply(&t.state, GameEvent::CloseQuestion).state;
            if i + 1 == 8 {
                assert!(t.outcome.unwrap().unlocked.is_none());
            }
        }
        assert!(state.all_completed());
        let expected: u32 = (0..8).map(|i| 75 + 35 * i).sum();
        assert_eq!(state.player.coins, expected);
        assert_eq!(state.player.xp, 800);
    }

    #[test]
    fn test_close_and_toggle() {
        let state = open_first(&fresh());
        let state = apply(&state, GameEvent::Answer(wrong_option(&state))).state;
        let closed = apply(&state, GameEvent::CloseQuestion).state;
        assert!(closed.open.is_none());
        assert_eq!(closed.attempts, 0);

        let toggled = apply(&closed, GameEvent::ToggleHints).state;
        assert!(!toggled.hints_enabled);
        assert!(apply(&toggled, GameEvent::ToggleHints).state.hints_enabled);
    }

    #[test]
    fn test_progression_persists_changes() {
        let mut p = Progression::new(QuestionBank::standard(), Settings::default(), 1, MemoryStore::new());
        assert_eq!(p.store().writes(), 0);
        let rev = p.revision();

        p.dispatch(GameEvent::MovePlayer { x: 1.0, z: 2.0 });
        assert_eq!(p.store().writes(), 1);
        assert_eq!(p.revision(), rev + 1);

        // Unchanged snapshot: nothing published or written
        p.dispatch(GameEvent::Answer(0));
        assert_eq!(p.store().writes(), 1);
        assert_eq!(p.revision(), rev + 1);

        let saved = p.store().load().unwrap().unwrap();
        assert_eq!((saved.player.x, saved.player.y), (1.0, 2.0));
    }

    #[test]
    fn test_progression_restores_on_start() {
        let mut store = MemoryStore::new();
        {
            let mut p = Progression::new(QuestionBank::standard(), Settings::default(), 5, store.clone());
            p.dispatch(GameEvent::Interact(ObjectiveId::for_index(0)));
            let option = p.state().current_question().unwrap().correct_option;
            p.dispatch(GameEvent::Answer(option));
            store = p.store().clone();
        }
        let p = Progression::new(QuestionBank::standard(), Settings::default(), 6, store);
        let state = p.state();
        assert_eq!(state.player.coins, 75);
        assert_eq!(state.player.xp, 100);
        assert!(state.objectives[0].completed);
        assert!(state.objectives[1].unlocked);
        assert!(state.open.is_none());
    }

    #[test]
    fn test_malformed_save_falls_back_to_fresh() {
        let p = Progression::new(
            QuestionBank::standard(),
            Settings::default(),
            5,
            MemoryStore::with_raw("{\"player\": nope"),
        );
        let reference = Progression::new(QuestionBank::standard(), Settings::default(), 5, MemoryStore::new());
        assert_eq!(p.state(), reference.state());
    }

    #[test]
    fn test_failed_write_keeps_snapshot() {
        let mut p = Progression::new(QuestionBank::standard(), Settings::default(), 5, MemoryStore::failing());
        p.dispatch(GameEvent::MovePlayer { x: 9.0, z: 9.0 });
        assert_eq!(p.state().player.position, Vec2::new(9.0, 9.0));
    }

    #[test]
    fn test_unvalidated_layout_settings_still_start() {
        let mut settings = Settings::default();
        settings.layout.inner_radius = 1.0;
        settings.layout.outer_radius = 1.0;
        settings.layout.relax_factor = 1.0;
        settings.layout.attempt_cap = 10;
        assert!(settings.validate().is_err());

        let p = Progression::new(QuestionBank::standard(), settings, 8, MemoryStore::new());
        assert_eq!(p.state().objectives.len(), 8);
        assert!(p.layout_relaxed());
        assert!(p.state().check_invariants().is_ok());
    }

    #[test]
    fn test_reset_matches_fresh_initialize() {
        let mut p = Progression::new(QuestionBank::standard(), Settings::default(), 11, MemoryStore::new());
        p.dispatch(GameEvent::MovePlayer { x: 4.0, z: 4.0 });
        p.dispatch(GameEvent::ToggleHints);
        p.dispatch(GameEvent::Interact(ObjectiveId::for_index(0)));
        let option = p.state().current_question().unwrap().correct_option;
        p.dispatch(GameEvent::Answer(option));
        p.dispatch(GameEvent::Interact(ObjectiveId::for_index(1)));
        assert!(p.store().raw().is_some());

        p.dispatch(GameEvent::Reset);
        assert!(p.store().raw().is_none());

        // Equal to a fresh snapshot over the same newly drawn objectives
        let expected = GameState::from_objectives(
            p.state()
                .objectives
                .iter()
                .cloned()
                .enumerate()
                .map(|(i, mut o)| {
                    o.unlocked = i == 0;
                    o.completed = false;
                    o
                })
                .collect(),
        );
        assert_eq!(p.state(), &expected);
    }

    fn event_strategy() -> impl Strategy<Value = GameEvent> {
        prop_oneof![
            (-200.0f32..200.0, -200.0f32..200.0).prop_map(|(x, z)| GameEvent::MovePlayer { x, z }),
            (0usize..10).prop_map(|i| GameEvent::Interact(ObjectiveId::for_index(i))),
            (0usize..5).prop_map(GameEvent::Answer),
            Just(GameEvent::CloseQuestion),
            Just(GameEvent::ToggleHints),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold(seed in any::<u64>(), events in prop::collection::vec(event_strategy(), 0..120)) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let questions = QuestionBank::standard().sample(&mut rng, 8);
            let mut state = initialize(questions, &mut rng, &LayoutSettings::default());
            let mut coins = 0;
            let mut xp = 0;
            for event in &events {
                state = step(&state, event, &rules()).state;
                prop_assert!(state.check_invariants().is_ok(), "{:?}", state.check_invariants());
                prop_assert!(state.player.coins >= coins);
                prop_assert!(state.player.xp >= xp);
                prop_assert!(state.attempts <= 3);
                coins = state.player.coins;
                xp = state.player.xp;
            }
        }
    }
}
