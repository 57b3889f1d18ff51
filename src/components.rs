//! Pure Yew view functions for the set session UI.
//!
//! Everything here renders from plain values and callbacks; state lives in
//! the `App` component and the session controller.

use set_coach::config::BarbellConfig;
use set_coach::metrics::{best_set, estimated_1rm, total_volume};
use set_coach::models::{Comparison, Recommendation, Set, SetId};
use set_coach::plates::{round_with, PlateConfiguration};
use set_coach::refresher::{CoachingBoard, Feed};
use set_coach::rest_timer::format_secs;
use yew::prelude::*;

/// Format a load without trailing zeros ("100", "102.5", "1.25").
pub fn format_kg(kg: f64) -> String {
    let text = format!("{:.2}", kg);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn format_rir(rir: Option<u8>) -> String {
    rir.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Renders one saved set that is not being edited.
pub fn render_set_row(
    set: &Set,
    busy: bool,
    on_edit: Callback<SetId>,
    on_delete: Callback<SetId>,
) -> Html {
    let Some(id) = set.id.clone() else {
        return Html::default();
    };
    let edit_id = id.clone();
    html! {
        <tr key={id.to_string()} class={classes!("set-row", busy.then_some("busy"))}>
            <td>{ set.set_number }</td>
            <td>{ format_kg(set.actual_weight) }</td>
            <td>{ set.actual_reps }</td>
            <td>{ format_rir(set.actual_rir) }</td>
            <td class="notes">{ set.notes.clone().unwrap_or_default() }</td>
            <td class="actions">
                <button class="btn-secondary small" disabled={busy}
                    onclick={on_edit.reform(move |_| edit_id.clone())}>
                    { "Edit" }
                </button>
                <button class="btn-danger small" disabled={busy}
                    onclick={on_delete.reform(move |_| id.clone())}>
                    { "Delete" }
                </button>
            </td>
        </tr>
    }
}

/// Renders the plates needed on each side for a configuration.
pub fn render_plates(config: &PlateConfiguration) -> Html {
    let class = if config.unloadable {
        "plates unloadable"
    } else {
        "plates"
    };
    html! {
        <div class={class}>
            <span class="plates-label">{ config.to_string() }</span>
            if config.remainder_per_side > 0.0 {
                <span class="plates-remainder">
                    { format!("{} kg per side cannot be loaded", format_kg(config.remainder_per_side)) }
                </span>
            }
        </div>
    }
}

fn render_plate_hint(weight: f64, barbell: &BarbellConfig) -> Html {
    match round_with(weight, barbell) {
        Ok(config) => render_plates(&config),
        Err(e) => html! { <div class="plates unloadable">{ e.to_string() }</div> },
    }
}

fn render_recommendation(feed: &Feed<Recommendation>, barbell: &BarbellConfig) -> Html {
    match feed {
        Feed::Idle => Html::default(),
        Feed::Loading => html! { <p class="loading">{ "Loading recommendation..." }</p> },
        Feed::Failed(e) => html! { <p class="current-error compact">{ e.to_string() }</p> },
        Feed::Ready(rec) => {
            let reps = if rec.target_reps_low == rec.target_reps_high {
                rec.target_reps_low.to_string()
            } else {
                format!("{}-{}", rec.target_reps_low, rec.target_reps_high)
            };
            html! {
                <div class="recommendation">
                    <h3>{ "Next set" }</h3>
                    <p class="recommendation-main">
                        { format!("{} kg × {} reps", format_kg(rec.recommended_weight_kg), reps) }
                        if let Some(rir) = rec.target_rir {
                            { format!(" @ RIR {}", rir) }
                        }
                    </p>
                    { render_plate_hint(rec.recommended_weight_kg, barbell) }
                    if let Some(readiness) = rec.readiness_score_percent {
                        <p class="readiness">{ format!("Readiness: {:.0}%", readiness) }</p>
                    }
                    if let Some(ref explanation) = rec.explanation {
                        <p class="explanation">{ explanation }</p>
                    }
                </div>
            }
        }
    }
}

fn render_comparison(feed: &Feed<Comparison>) -> Html {
    match feed {
        Feed::Idle => Html::default(),
        Feed::Loading => html! { <p class="loading">{ "Loading previous performance..." }</p> },
        Feed::Failed(e) => html! { <p class="current-error compact">{ e.to_string() }</p> },
        Feed::Ready(Comparison::NoPriorData) => {
            html! { <p class="no-prior">{ "No previous workout for this exercise" }</p> }
        }
        Feed::Ready(Comparison::Previous(previous)) => {
            let trend = match previous.is_positive_progression {
                Some(true) => "progress up",
                Some(false) => "progress down",
                None => "progress",
            };
            html! {
                <div class="comparison">
                    <h3>{ "Last time" }</h3>
                    if let Some(ref set) = previous.previous_set {
                        <p>
                            { format!("{} kg × {}", format_kg(set.actual_weight), set.actual_reps) }
                            if let Some(rir) = set.actual_rir {
                                { format!(" @ RIR {}", rir) }
                            }
                        </p>
                    }
                    if let Some(ref metric) = previous.progression_metric_string {
                        <p class={trend}>{ metric }</p>
                    }
                </div>
            }
        }
    }
}

/// Renders the coaching panel: recommendation plus previous performance.
pub fn render_coaching(board: &CoachingBoard, barbell: &BarbellConfig) -> Html {
    html! {
        <div class="coaching">
            { render_recommendation(&board.recommendation, barbell) }
            { render_comparison(&board.comparison) }
        </div>
    }
}

/// Renders session totals below the set table.
pub fn render_summary(sets: &[Set]) -> Html {
    if sets.is_empty() {
        return html! { <p class="no-results-message">{ "No sets logged yet" }</p> };
    }
    let volume = total_volume(sets);
    let best = best_set(sets)
        .map(|s| estimated_1rm(s.actual_weight, s.actual_reps))
        .unwrap_or(0.0);
    html! {
        <div class="summary">
            <span>{ format!("Volume: {} kg", format_kg(volume)) }</span>
            <span>{ format!("Best e1RM: {:.1} kg", best) }</span>
        </div>
    }
}

pub fn render_rest_timer(remaining_secs: u32, running: bool, on_stop: Callback<()>) -> Html {
    if !running {
        return Html::default();
    }
    html! {
        <div class="rest-timer">
            <span class="rest-remaining">{ format_secs(remaining_secs) }</span>
            <button class="btn-secondary small" onclick={on_stop.reform(|_| ())}>
                { "Skip rest" }
            </button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kg_formatting_drops_trailing_zeros() {
        assert_eq!(format_kg(100.0), "100");
        assert_eq!(format_kg(102.5), "102.5");
        assert_eq!(format_kg(1.25), "1.25");
        assert_eq!(format_kg(0.0), "0");
    }

    #[test]
    fn missing_rir_shows_dash() {
        assert_eq!(format_rir(None), "-");
        assert_eq!(format_rir(Some(2)), "2");
    }
}
