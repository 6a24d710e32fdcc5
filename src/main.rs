//! Treasure Trail entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent, MouseEvent};

    use treasure_trail::persistence::LocalStorageStore;
    use treasure_trail::sim::{GameEvent, MovementLoop, Progression};
    use treasure_trail::{QuestionBank, Settings};

    #[wasm_bindgen(inline_js = "
        export function request_pointer_lock() {
            const canvas = document.getElementById('canvas');
            if (canvas) {
                canvas.requestPointerLock();
            }
        }
    ")]
    extern "C" {
        fn request_pointer_lock();
    }

    /// Game instance holding all state
    pub struct Game {
        movement: MovementLoop,
        progression: Progression<LocalStorageStore>,
        /// Revision last drawn to the HUD
        shown_revision: Option<u64>,
    }

    impl Game {
        fn new(settings: Settings, seed: u64) -> Self {
            let movement = MovementLoop::new(settings.movement.clone(), settings.camera.clone());
            let progression = Progression::new(
                QuestionBank::standard(),
                settings,
                seed,
                LocalStorageStore::default(),
            );
            Self {
                movement,
                progression,
                shown_revision: None,
            }
        }

        pub fn progression(&self) -> &Progression<LocalStorageStore> {
            &self.progression
        }

        pub fn dispatch(&mut self, event: GameEvent) -> Option<String> {
            let outcome = self.progression.dispatch(event)?;
            serde_json::to_string(&outcome).ok()
        }

        fn frame(&mut self) {
            let out = self.movement.tick(self.progression.state());
            for event in out.events {
                self.progression.dispatch(event);
            }
            if self.shown_revision != Some(self.progression.revision()) {
                self.update_hud();
                self.shown_revision = Some(self.progression.revision());
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let state = self.progression.state();
            let max_attempts = self.progression.settings().progression.max_attempts;

            set_text(&document, "hud-coins", &state.player.coins.to_string());
            set_text(&document, "hud-xp", &state.player.xp.to_string());
            set_text(&document, "hud-level", &state.player.level.to_string());
            set_text(
                &document,
                "hud-progress",
                &format!("{}/{}", state.completed_count(), state.objectives.len()),
            );

            // Question panel
            match state.open_objective() {
                Some(objective) => {
                    set_hidden(&document, "question-panel", false);
                    set_text(&document, "question-text", objective.question.prompt);
                    for (i, option) in objective.question.options.iter().enumerate() {
                        set_text(&document, &format!("option-{}", i), option);
                    }
                    let status = if objective.completed {
                        objective.question.explanation.to_string()
                    } else {
                        format!("Attempts left: {}", state.attempts_left(max_attempts))
                    };
                    set_text(&document, "question-status", &status);
                }
                None => set_hidden(&document, "question-panel", true),
            }

            set_hidden(&document, "all-complete", !state.all_completed());
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    thread_local! {
        static GAME: RefCell<Option<Game>> = const { RefCell::new(None) };
    }

    /// Run `f` against the live game, if started
    pub fn with_game<R>(f: impl FnOnce(&mut Game) -> R) -> Option<R> {
        GAME.with(|game| game.borrow_mut().as_mut().map(f))
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Treasure Trail starting...");

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let game = Game::new(settings, seed);
        if game.progression().layout_relaxed() {
            log::warn!("Treasure boxes are closer together than usual this run");
        }
        GAME.with(|g| *g.borrow_mut() = Some(game));

        setup_input_handlers();
        start_animation_loop();

        log::info!("Treasure Trail running with seed {}", seed);
    }

    fn setup_input_handlers() {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Keyboard down
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key().to_lowercase();
                if key == " " {
                    event.prevent_default();
                    if event.repeat() {
                        return;
                    }
                }
                if key == "h" {
                    with_game(|g| g.dispatch(GameEvent::ToggleHints));
                    return;
                }
                with_game(|g| g.movement.input.key_down(&key));
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key().to_lowercase();
                with_game(|g| g.movement.input.key_up(&key));
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur - keys released elsewhere never reach us
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                with_game(|g| g.movement.input.release_all());
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move - look only while pointer locked
        {
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if doc.pointer_lock_element().is_some() {
                    with_game(|g| {
                        g.movement
                            .input
                            .add_look(event.movement_x() as f32, event.movement_y() as f32)
                    });
                }
            });
            let _ = document
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click on the scene - request pointer lock
        if let Some(canvas) = document.get_element_by_id("canvas") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                request_pointer_lock();
            });
            let _ = canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn start_animation_loop() {
        let frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let next = frame.clone();
        *next.borrow_mut() = Some(Closure::new(move |_time: f64| {
            with_game(|g| g.frame());
            if let Some(cb) = frame.borrow().as_ref() {
                request_animation_frame(cb);
            }
        }));
        if let Some(cb) = next.borrow().as_ref() {
            request_animation_frame(cb);
        }
    }

    fn request_animation_frame(closure: &Closure<dyn FnMut(f64)>) {
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        }
    }
}

/// Answer the open question. Returns the outcome as JSON.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn answer_question(option: usize) -> Option<String> {
    wasm_game::with_game(|g| g.dispatch(treasure_trail::sim::GameEvent::Answer(option))).flatten()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn close_question() {
    wasm_game::with_game(|g| g.dispatch(treasure_trail::sim::GameEvent::CloseQuestion));
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn toggle_hints() {
    wasm_game::with_game(|g| g.dispatch(treasure_trail::sim::GameEvent::ToggleHints));
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn reset_game() {
    wasm_game::with_game(|g| g.dispatch(treasure_trail::sim::GameEvent::Reset));
}

/// Current snapshot as JSON (for the page's overlays)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn snapshot_json() -> String {
    wasm_game::with_game(|g| serde_json::to_string(g.progression().state()).unwrap_or_default())
        .unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use treasure_trail::persistence::FileStore;
    use treasure_trail::sim::{GameEvent, MovementLoop, Progression};
    use treasure_trail::{QuestionBank, Settings};

    /// Give up after this many frames
    const MAX_TICKS: u32 = 20_000;

    /// Default save file of the headless run
    pub const SAVE_PATH: &str = "treasure_trail_save.json";

    pub struct Summary {
        pub ticks: u32,
        pub coins: u32,
        pub xp: u32,
        pub completed: usize,
        pub total: usize,
    }

    /// Walk to every box in turn and answer it. Odd-numbered boxes are
    /// answered correctly; even-numbered ones run out of attempts.
    pub fn run(settings: Settings, seed: u64, save_path: &str) -> Summary {
        let mut movement = MovementLoop::new(settings.movement.clone(), settings.camera.clone());
        let mut progression = Progression::new(
            QuestionBank::standard(),
            settings,
            seed,
            FileStore::new(save_path),
        );

        if progression.state().all_completed() {
            log::info!("Saved run is already complete, starting over");
            progression.dispatch(GameEvent::Reset);
        }

        let mut ticks = 0;
        while ticks < MAX_TICKS && !progression.state().all_completed() {
            ticks += 1;
            let state = progression.state();

            if let Some(objective) = state.open_objective() {
                let event = if objective.completed {
                    GameEvent::CloseQuestion
                } else {
                    let number = state.objective_index(&objective.id).unwrap_or(0) + 1;
                    let correct = objective.question.correct_option;
                    if number % 2 == 1 {
                        GameEvent::Answer(correct)
                    } else {
                        GameEvent::Answer((correct + 1) % objective.question.options.len())
                    }
                };
                if let Some(outcome) = progression.dispatch(event) {
                    log::debug!("{:?}", outcome);
                }
                continue;
            }

            let Some(target) = state.next_objective() else {
                break;
            };
            movement
                .look_mut()
                .face(target.position - state.player.position);
            movement.input.forward = true;

            let out = movement.tick(progression.state());
            for event in out.events {
                progression.dispatch(event);
            }
        }

        let state = progression.state();
        Summary {
            ticks,
            coins: state.player.coins,
            xp: state.player.xp,
            completed: state.completed_count(),
            total: state.objectives.len(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Treasure Trail (native) starting...");
    log::info!("Native mode runs a headless autopilot - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match treasure_trail::Settings::load_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Could not load settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => treasure_trail::Settings::default(),
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);

    let summary = autopilot::run(settings, seed, autopilot::SAVE_PATH);
    log::info!(
        "Autopilot finished after {} ticks: {}/{} boxes, {} coins, {} xp",
        summary.ticks,
        summary.completed,
        summary.total,
        summary.coins,
        summary.xp
    );
    println!(
        "{}/{} boxes, {} coins, {} xp (seed {})",
        summary.completed, summary.total, summary.coins, summary.xp, seed
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
