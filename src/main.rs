//! Browser front end for logging the sets of one exercise in a workout.
//! Wires the session controller, input hooks, rest timer and views.

use gloo_utils::window;
use log::{info, LevelFilter};
use set_coach::api::{HttpSetApi, LocalStorageToken};
use set_coach::config::{
    BarbellConfig, ClientConfig, AUTH_TOKEN_STORAGE_KEY, DEFAULT_API_BASE_URL,
    DEFAULT_BAR_WEIGHT_KG, DEFAULT_REST_SECS,
};
use set_coach::models::{SetDraft, SetId};
use set_coach::plates::round_with;
use set_coach::rest_timer::{format_secs, RestCountdown, Tick};
use set_coach::session::{SessionScope, SetTarget};
use set_coach::sync::{BrowserSpawner, DeleteOutcome, SyncController};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::UrlSearchParams;
use yew::prelude::*;

mod components;
mod hooks;
mod input;

use components::{
    format_kg, render_coaching, render_plates, render_rest_timer, render_set_row, render_summary,
};
use hooks::{commit_on_enter, use_validated_input, ValidatedInput};
use input::{parse_reps, parse_rest_duration, parse_rir, parse_weight, InputError};

type Controller = SyncController<HttpSetApi>;
type Parser<T> = Rc<dyn Fn(&str) -> Result<T, InputError>>;

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Read the session scope from `?user=..&workout=..&exercise=..`.
fn read_scope() -> Option<SessionScope> {
    let search = window().location().search().ok()?;
    let params = UrlSearchParams::new_with_str(&search).ok()?;
    Some(SessionScope {
        user_id: params.get("user")?,
        workout_id: params.get("workout")?,
        exercise_id: params.get("exercise")?,
    })
}

/// The API is served from the page's own origin.
fn client_config() -> ClientConfig {
    match window().location().origin() {
        Ok(origin) => ClientConfig {
            base_url: format!("{}{}", origin, DEFAULT_API_BASE_URL),
        },
        Err(_) => ClientConfig::default(),
    }
}

fn build_controller(scope: SessionScope) -> Controller {
    let token = Rc::new(LocalStorageToken::new(AUTH_TOKEN_STORAGE_KEY));
    let api = Rc::new(HttpSetApi::new(&client_config(), token));
    SyncController::new(api, scope, Rc::new(BrowserSpawner))
}

fn weight_parser() -> Parser<f64> {
    Rc::new(parse_weight)
}

fn reps_parser() -> Parser<i32> {
    Rc::new(parse_reps)
}

fn rir_parser() -> Parser<Option<i32>> {
    Rc::new(parse_rir)
}

fn rest_parser() -> Parser<u32> {
    Rc::new(parse_rest_duration)
}

fn format_reps(reps: &i32) -> String {
    reps.to_string()
}

fn format_rir(rir: &Option<i32>) -> String {
    rir.map(|r| r.to_string()).unwrap_or_default()
}

/// Parse the text of every field of a set form into a draft.
fn read_draft(
    weight: &ValidatedInput<f64>,
    reps: &ValidatedInput<i32>,
    rir: &ValidatedInput<Option<i32>>,
    notes: &str,
) -> Result<SetDraft, InputError> {
    Ok(SetDraft {
        actual_weight: weight.current(&parse_weight)?,
        actual_reps: reps.current(&parse_reps)?,
        actual_rir: rir.current(&parse_rir)?,
        notes: Some(notes.to_string()),
    })
}

/// Rest duration as currently typed, committed or not.
fn rest_duration(rest_input: &ValidatedInput<u32>) -> Result<u32, InputError> {
    rest_input.current(&parse_rest_duration)
}

fn start_rest(
    countdown: &Rc<RefCell<RestCountdown>>,
    duration_secs: u32,
    remaining: UseStateHandle<u32>,
    running: UseStateHandle<bool>,
) {
    info!("Resting for {}", format_secs(duration_secs));
    remaining.set(duration_secs);
    running.set(duration_secs > 0);
    countdown
        .borrow_mut()
        .start(duration_secs, move |tick| match tick {
            Tick::Running { remaining_secs } => remaining.set(remaining_secs),
            Tick::Finished => {
                remaining.set(0);
                running.set(false);
            }
            Tick::Idle => running.set(false),
        });
}

fn text_oninput(handle: &UseStateHandle<String>) -> Callback<InputEvent> {
    let handle = handle.clone();
    Callback::from(move |e: InputEvent| {
        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
        handle.set(input.value());
    })
}

// ──────────────────────────────────────────────────────────────────────────────

#[derive(Properties, PartialEq)]
struct SessionProps {
    scope: SessionScope,
}

/// One (workout, exercise) session: set table, new set row, coaching, rest.
#[function_component(SessionView)]
fn session_view(props: &SessionProps) -> Html {
    let ctrl = use_memo(props.scope.clone(), |scope| build_controller(scope.clone()));
    let barbell = use_memo((), |_| BarbellConfig::default());
    let force_update = use_force_update();
    let error_message = use_state(|| None::<String>);

    // New set row
    let weight =
        use_validated_input(DEFAULT_BAR_WEIGHT_KG, weight_parser(), |w: &f64| format_kg(*w));
    let reps = use_validated_input(0, reps_parser(), format_reps);
    let rir = use_validated_input(None, rir_parser(), format_rir);
    let notes = use_state(String::new);

    // Edit row
    let edit_weight = use_validated_input(0.0, weight_parser(), |w: &f64| format_kg(*w));
    let edit_reps = use_validated_input(0, reps_parser(), format_reps);
    let edit_rir = use_validated_input(None, rir_parser(), format_rir);
    let edit_notes = use_state(String::new);

    // Rest timer
    let countdown = use_mut_ref(RestCountdown::new);
    let rest_remaining = use_state(|| 0u32);
    let rest_running = use_state(|| false);
    let rest_input =
        use_validated_input(DEFAULT_REST_SECS, rest_parser(), |s: &u32| format_secs(*s));

    // Re-render on every session event and load the sets once
    {
        let ctrl = ctrl.clone();
        let force_update = force_update.clone();
        let error_message = error_message.clone();
        use_effect_with(props.scope.clone(), move |_| {
            ctrl.subscribe(move |_| force_update.force_update());
            let ctrl = (*ctrl).clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = ctrl.load_sets().await {
                    error_message.set(Some(e.to_string()));
                }
            });
            || ()
        });
    }

    let on_create = {
        let ctrl = ctrl.clone();
        let error_message = error_message.clone();
        let force_update = force_update.clone();
        let (weight, reps, rir, notes) = (weight.clone(), reps.clone(), rir.clone(), notes.clone());
        let countdown = countdown.clone();
        let (rest_remaining, rest_running) = (rest_remaining.clone(), rest_running.clone());
        let rest_input = rest_input.clone();
        Callback::from(move |_: ()| {
            let parsed = read_draft(&weight, &reps, &rir, &notes)
                .and_then(|draft| rest_duration(&rest_input).map(|secs| (draft, secs)));
            let (draft, rest_secs) = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    error_message.set(Some(e.to_string()));
                    return;
                }
            };
            let ctrl = (*ctrl).clone();
            let error_message = error_message.clone();
            let force_update_task = force_update.clone();
            let notes = notes.clone();
            let countdown = countdown.clone();
            let (rest_remaining, rest_running) = (rest_remaining.clone(), rest_running.clone());
            wasm_bindgen_futures::spawn_local(async move {
                match ctrl.create_set(draft).await {
                    Ok(_) => {
                        error_message.set(None);
                        notes.set(String::new());
                        start_rest(&countdown, rest_secs, rest_remaining, rest_running);
                    }
                    Err(e) => error_message.set(Some(e.to_string())),
                }
                force_update_task.force_update();
            });
            force_update.force_update();
        })
    };

    let on_edit = {
        let ctrl = ctrl.clone();
        let error_message = error_message.clone();
        let (edit_weight, edit_reps, edit_rir, edit_notes) = (
            edit_weight.clone(),
            edit_reps.clone(),
            edit_rir.clone(),
            edit_notes.clone(),
        );
        Callback::from(move |id: SetId| {
            if let Err(e) = ctrl.begin_edit(&id) {
                error_message.set(Some(e.to_string()));
                return;
            }
            let draft = ctrl.with_session(|s| s.edit().draft().cloned());
            if let Some(draft) = draft {
                edit_weight.set_value.emit(draft.actual_weight);
                edit_reps.set_value.emit(draft.actual_reps);
                edit_rir.set_value.emit(draft.actual_rir);
                edit_notes.set(draft.notes.unwrap_or_default());
            }
            error_message.set(None);
        })
    };

    let on_cancel_edit = {
        let ctrl = ctrl.clone();
        Callback::from(move |_: MouseEvent| ctrl.cancel_edit())
    };

    let on_save_edit = {
        let ctrl = ctrl.clone();
        let error_message = error_message.clone();
        let force_update = force_update.clone();
        let (edit_weight, edit_reps, edit_rir, edit_notes) = (
            edit_weight.clone(),
            edit_reps.clone(),
            edit_rir.clone(),
            edit_notes.clone(),
        );
        Callback::from(move |_: ()| {
            let draft = match read_draft(&edit_weight, &edit_reps, &edit_rir, &edit_notes) {
                Ok(draft) => draft,
                Err(e) => {
                    error_message.set(Some(e.to_string()));
                    return;
                }
            };
            if let Err(e) = ctrl.update_draft(|staged| *staged = draft) {
                error_message.set(Some(e.to_string()));
                return;
            }
            let ctrl = (*ctrl).clone();
            let error_message = error_message.clone();
            let force_update_task = force_update.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match ctrl.save_edit().await {
                    Ok(_) => error_message.set(None),
                    Err(e) => error_message.set(Some(e.to_string())),
                }
                force_update_task.force_update();
            });
            force_update.force_update();
        })
    };

    let on_delete = {
        let ctrl = ctrl.clone();
        let error_message = error_message.clone();
        let force_update = force_update.clone();
        Callback::from(move |id: SetId| {
            let ctrl = (*ctrl).clone();
            let error_message = error_message.clone();
            let force_update = force_update.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let confirm = |set: &set_coach::Set| {
                    window()
                        .confirm_with_message(&format!("Delete set {}?", set.set_number))
                        .unwrap_or(false)
                };
                match ctrl.delete_set(&id, confirm).await {
                    Ok(DeleteOutcome::Deleted(_)) => error_message.set(None),
                    Ok(DeleteOutcome::Declined) => {}
                    Err(e) => error_message.set(Some(e.to_string())),
                }
                force_update.force_update();
            });
        })
    };

    let on_use_recommendation = {
        let ctrl = ctrl.clone();
        let barbell = barbell.clone();
        let (weight, reps, rir) = (weight.clone(), reps.clone(), rir.clone());
        Callback::from(move |_: MouseEvent| {
            let board = ctrl.coaching();
            let Some(rec) = board.recommendation.ready() else {
                return;
            };
            let load = round_with(rec.recommended_weight_kg, &barbell)
                .map(|config| config.final_load)
                .unwrap_or(rec.recommended_weight_kg);
            weight.set_value.emit(load);
            reps.set_value.emit(rec.target_reps_high as i32);
            rir.set_value.emit(rec.target_rir.map(i32::from));
        })
    };

    let on_start_rest = {
        let countdown = countdown.clone();
        let (rest_remaining, rest_running) = (rest_remaining.clone(), rest_running.clone());
        let rest_input = rest_input.clone();
        let error_message = error_message.clone();
        Callback::from(move |_: MouseEvent| match rest_duration(&rest_input) {
            Ok(secs) => start_rest(&countdown, secs, rest_remaining.clone(), rest_running.clone()),
            Err(e) => error_message.set(Some(e.to_string())),
        })
    };

    let on_stop_rest = {
        let countdown = countdown.clone();
        let (rest_remaining, rest_running) = (rest_remaining.clone(), rest_running.clone());
        Callback::from(move |_: ()| {
            countdown.borrow_mut().stop();
            rest_remaining.set(0);
            rest_running.set(false);
        })
    };

    let sets = ctrl.sets();
    let board = ctrl.coaching();
    let (editing_id, pending_busy) = ctrl.with_session(|s| {
        (
            s.edit().editing_id().cloned(),
            s.is_in_flight(&SetTarget::PendingRow),
        )
    });
    let busy = |id: &SetId| ctrl.with_session(|s| s.is_in_flight(&SetTarget::Set(id.clone())));
    let next_number = ctrl.with_session(|s| s.cache().next_set_number());
    let pending_plates = round_with(weight.value, &barbell).ok();

    html! {
        <div class="container">
            <h1>{ "Log Sets" }</h1>

            if let Some(ref err) = *error_message {
                <div class="current-error">{ err }</div>
            }

            <div class="results-area">
                <table class="set-table">
                    <thead>
                        <tr>
                            <th>{ "Set #" }</th>
                            <th>{ "Weight (kg)" }</th>
                            <th>{ "Reps" }</th>
                            <th>{ "RIR" }</th>
                            <th>{ "Notes" }</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        { for sets.iter().map(|set| {
                            let is_editing = set.id.is_some() && set.id == editing_id;
                            let row_busy = set.id.as_ref().map(|id| busy(id)).unwrap_or(false);
                            if is_editing {
                                html! {
                                    <tr key={format!("edit-{}", set.set_number)} class={classes!("edit-row", row_busy.then_some("busy"))}>
                                        <td>{ set.set_number }</td>
                                        <td>
                                            <input type="text" inputmode="decimal"
                                                value={edit_weight.text.clone()}
                                                class={if edit_weight.error.is_some() { "invalid" } else { "" }}
                                                oninput={edit_weight.on_text_input.clone()}
                                                onchange={edit_weight.on_commit.reform(|_| ())}
                                                onkeydown={commit_on_enter(&on_save_edit)}
                                            />
                                        </td>
                                        <td>
                                            <input type="number"
                                                value={edit_reps.text.clone()}
                                                class={if edit_reps.error.is_some() { "invalid" } else { "" }}
                                                oninput={edit_reps.on_text_input.clone()}
                                                onchange={edit_reps.on_commit.reform(|_| ())}
                                                onkeydown={commit_on_enter(&on_save_edit)}
                                            />
                                        </td>
                                        <td>
                                            <input type="number" min="0" max="10"
                                                value={edit_rir.text.clone()}
                                                class={if edit_rir.error.is_some() { "invalid" } else { "" }}
                                                oninput={edit_rir.on_text_input.clone()}
                                                onchange={edit_rir.on_commit.reform(|_| ())}
                                                onkeydown={commit_on_enter(&on_save_edit)}
                                            />
                                        </td>
                                        <td>
                                            <input type="text"
                                                value={(*edit_notes).clone()}
                                                oninput={text_oninput(&edit_notes)}
                                            />
                                        </td>
                                        <td class="actions">
                                            <button class="btn-primary small" disabled={row_busy}
                                                onclick={on_save_edit.reform(|_| ())}>
                                                { "Save" }
                                            </button>
                                            <button class="btn-secondary small" disabled={row_busy}
                                                onclick={on_cancel_edit.clone()}>
                                                { "Cancel" }
                                            </button>
                                        </td>
                                    </tr>
                                }
                            } else {
                                render_set_row(set, row_busy, on_edit.clone(), on_delete.clone())
                            }
                        }) }

                        <tr key="pending" class={classes!("pending-row", pending_busy.then_some("busy"))}>
                            <td>{ next_number }</td>
                            <td>
                                <input type="text" inputmode="decimal"
                                    value={weight.text.clone()}
                                    class={if weight.error.is_some() { "invalid" } else { "" }}
                                    oninput={weight.on_text_input.clone()}
                                    onchange={weight.on_commit.reform(|_| ())}
                                    onkeydown={commit_on_enter(&weight.on_commit)}
                                />
                            </td>
                            <td>
                                <input type="number"
                                    value={reps.text.clone()}
                                    class={if reps.error.is_some() { "invalid" } else { "" }}
                                    oninput={reps.on_text_input.clone()}
                                    onchange={reps.on_commit.reform(|_| ())}
                                    onkeydown={commit_on_enter(&on_create)}
                                />
                            </td>
                            <td>
                                <input type="number" min="0" max="10"
                                    value={rir.text.clone()}
                                    class={if rir.error.is_some() { "invalid" } else { "" }}
                                    oninput={rir.on_text_input.clone()}
                                    onchange={rir.on_commit.reform(|_| ())}
                                    onkeydown={commit_on_enter(&on_create)}
                                />
                            </td>
                            <td>
                                <input type="text" placeholder="Notes"
                                    value={(*notes).clone()}
                                    oninput={text_oninput(&notes)}
                                />
                            </td>
                            <td class="actions">
                                <button class="btn-primary small" disabled={pending_busy}
                                    onclick={on_create.reform(|_| ())}>
                                    { "Log set" }
                                </button>
                            </td>
                        </tr>
                    </tbody>
                </table>

                { for [&weight.error, &reps.error, &rir.error, &edit_weight.error, &edit_reps.error, &edit_rir.error]
                    .into_iter()
                    .flatten()
                    .map(|err| html! { <div class="input-error">{ err }</div> }) }

                if let Some(ref plates) = pending_plates {
                    { render_plates(plates) }
                }
                { render_summary(&sets) }
            </div>

            <div class="settings-section">
                { render_coaching(&board, &barbell) }
                if board.recommendation.ready().is_some() {
                    <button class="btn-secondary small" onclick={on_use_recommendation}>
                        { "Use recommendation" }
                    </button>
                }
            </div>

            <div class="form-group">
                <label for="rest_input">{ "Rest:" }</label>
                <input
                    type="text"
                    id="rest_input"
                    placeholder="2:00"
                    value={rest_input.text.clone()}
                    class={if rest_input.error.is_some() { "invalid" } else { "" }}
                    oninput={rest_input.on_text_input.clone()}
                    onchange={rest_input.on_commit.reform(|_| ())}
                    onkeydown={commit_on_enter(&rest_input.on_commit)}
                />
                if let Some(ref err) = rest_input.error {
                    <div class="input-error">{ err }</div>
                }
                if !*rest_running {
                    <button class="btn-secondary small" onclick={on_start_rest}>
                        { "Start rest" }
                    </button>
                }
                { render_rest_timer(*rest_remaining, *rest_running, on_stop_rest) }
            </div>
        </div>
    }
}

/// Top-level component: resolves the session scope from the page URL.
#[function_component]
pub fn App() -> Html {
    let scope = use_memo((), |_| read_scope());
    match (*scope).clone() {
        Some(scope) => html! { <SessionView {scope} /> },
        None => html! {
            <div class="container">
                <p class="no-results-message">
                    { "Open this page with ?user=..&workout=..&exercise=.. to log sets." }
                </p>
            </div>
        },
    }
}

/// Entry point: installs logging and renders the App component.
fn main() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    set_coach::logging::init(level);
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<T: Clone + PartialEq + 'static>(text: &str, value: T) -> ValidatedInput<T> {
        ValidatedInput {
            text: text.to_string(),
            value,
            error: None,
            on_text_input: Callback::noop(),
            on_commit: Callback::noop(),
            set_value: Callback::noop(),
        }
    }

    #[test]
    fn rest_duration_reads_uncommitted_text() {
        assert_eq!(rest_duration(&field("1:30", DEFAULT_REST_SECS)), Ok(90));
        assert!(rest_duration(&field("soon", DEFAULT_REST_SECS)).is_err());
    }

    #[test]
    fn draft_reads_every_field_as_typed() {
        let draft = read_draft(
            &field("82,5", DEFAULT_BAR_WEIGHT_KG),
            &field("5", 0),
            &field("", Some(2)),
            "paused",
        )
        .unwrap();
        assert_eq!(draft.actual_weight, 82.5);
        assert_eq!(draft.actual_reps, 5);
        assert_eq!(draft.actual_rir, None);
        assert_eq!(draft.notes.as_deref(), Some("paused"));
    }
}
