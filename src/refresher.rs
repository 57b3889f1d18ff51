//! Keeps the coaching panel (recommended next set, comparison with the
//! previous workout) in step with the set cache.
//!
//! Each refresh takes a new token. Results are only published while their
//! token is still the latest, so a slow response from an older refresh can
//! never overwrite a newer one.

use crate::api::SetApi;
use crate::error::{ApiError, SessionError};
use crate::events::{EventBus, SessionEvent};
use crate::metrics::compare_to_previous;
use crate::models::{Comparison, Recommendation, Set};
use log::{debug, error, warn};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

/// Display state of one coaching feed.
#[derive(Clone, Debug, PartialEq)]
pub enum Feed<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(SessionError),
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Feed::Idle
    }
}

impl<T> Feed<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Feed::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoachingBoard {
    pub recommendation: Feed<Recommendation>,
    pub comparison: Feed<Comparison>,
}

pub struct RecommendationRefresher<A> {
    api: Rc<A>,
    board: Rc<RefCell<CoachingBoard>>,
    latest: Rc<Cell<u64>>,
    events: EventBus,
}

impl<A> Clone for RecommendationRefresher<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            board: self.board.clone(),
            latest: self.latest.clone(),
            events: self.events.clone(),
        }
    }
}

fn to_feed<T>(result: Result<T, ApiError>, what: &str) -> Feed<T> {
    match result {
        Ok(value) => Feed::Ready(value),
        Err(e @ ApiError::Unauthorized(_)) => {
            error!("{} refused: {}", what, e);
            Feed::Failed(e.into())
        }
        Err(e) => {
            warn!("{} failed: {}", what, e);
            Feed::Failed(e.into())
        }
    }
}

/// Fill in a progression label the server left out.
fn complete_comparison(comparison: Comparison, current_best: Option<&Set>) -> Comparison {
    match (comparison, current_best) {
        (Comparison::Previous(mut previous), Some(best)) => {
            if let Some(previous_set) = &previous.previous_set {
                let progression = compare_to_previous(best, previous_set);
                if previous.progression_metric_string.is_none() {
                    previous.progression_metric_string = Some(progression.label);
                }
                if previous.is_positive_progression.is_none() {
                    previous.is_positive_progression = Some(progression.is_positive);
                }
            }
            Comparison::Previous(previous)
        }
        (comparison, _) => comparison,
    }
}

impl<A: SetApi + 'static> RecommendationRefresher<A> {
    pub fn new(api: Rc<A>, events: EventBus) -> Self {
        Self {
            api,
            board: Rc::new(RefCell::new(CoachingBoard::default())),
            latest: Rc::new(Cell::new(0)),
            events,
        }
    }

    pub fn board(&self) -> CoachingBoard {
        self.board.borrow().clone()
    }

    /// Start a refresh and supersede any still running.
    ///
    /// Both reads run concurrently and publish independently; the returned
    /// future completes once both have settled.
    pub fn refresh(
        &self,
        user_id: &str,
        exercise_id: &str,
        current_best: Option<Set>,
    ) -> impl Future<Output = ()> + 'static {
        let token = self.latest.get().wrapping_add(1);
        self.latest.set(token);
        {
            let mut board = self.board.borrow_mut();
            board.recommendation = Feed::Loading;
            board.comparison = Feed::Loading;
        }
        debug!("Coaching refresh #{} for exercise {}", token, exercise_id);

        let recommendation = {
            let this = self.clone();
            let user_id = user_id.to_string();
            let exercise_id = exercise_id.to_string();
            async move {
                let result = this
                    .api
                    .recommend_set_parameters(&user_id, &exercise_id)
                    .await;
                this.publish(token, "Recommendation", |board| {
                    board.recommendation = to_feed(result, "Recommendation");
                });
            }
        };

        let comparison = {
            let this = self.clone();
            let exercise_id = exercise_id.to_string();
            async move {
                let result = this
                    .api
                    .previous_performance(&exercise_id)
                    .await
                    .map(|c| complete_comparison(c, current_best.as_ref()));
                this.publish(token, "Previous performance", |board| {
                    board.comparison = to_feed(result, "Previous performance");
                });
            }
        };

        async move {
            futures::join!(recommendation, comparison);
        }
    }

    fn publish(&self, token: u64, what: &str, apply: impl FnOnce(&mut CoachingBoard)) {
        if self.latest.get() != token {
            debug!("{} from refresh #{} superseded, dropped", what, token);
            return;
        }
        apply(&mut self.board.borrow_mut());
        self.events.emit(SessionEvent::CoachingUpdated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::models::{PreviousPerformance, PreviousSet};
    use crate::set_cache::test_set;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    fn recommendation(weight: f64) -> Recommendation {
        Recommendation {
            recommended_weight_kg: weight,
            target_reps_low: 5,
            target_reps_high: 8,
            target_rir: Some(2),
            explanation: None,
            readiness_score_percent: Some(90.0),
        }
    }

    fn previous(weight: f64) -> Comparison {
        Comparison::Previous(PreviousPerformance {
            previous_set: Some(PreviousSet {
                actual_weight: weight,
                actual_reps: 1,
                actual_rir: None,
            }),
            progression_metric_string: None,
            is_positive_progression: None,
        })
    }

    #[test]
    fn publishes_both_results() {
        let api = Rc::new(FakeApi::new());
        api.recommend.reply(Ok(recommendation(100.0)));
        api.previous.reply(Ok(Comparison::NoPriorData));
        let refresher = RecommendationRefresher::new(api.clone(), EventBus::new());

        block_on(refresher.refresh("u1", "e1", None));

        let board = refresher.board();
        assert_eq!(board.recommendation, Feed::Ready(recommendation(100.0)));
        assert_eq!(board.comparison, Feed::Ready(Comparison::NoPriorData));
    }

    #[test]
    fn one_failure_does_not_block_the_other() {
        let api = Rc::new(FakeApi::new());
        api.recommend.reply(Err(ApiError::remote(500, None)));
        api.previous.reply(Ok(previous(100.0)));
        let refresher = RecommendationRefresher::new(api.clone(), EventBus::new());

        block_on(refresher.refresh("u1", "e1", None));

        let board = refresher.board();
        assert!(matches!(board.recommendation, Feed::Failed(SessionError::Remote { status: 500, .. })));
        assert!(board.comparison.ready().is_some());
    }

    #[test]
    fn later_refresh_wins_regardless_of_completion_order() {
        let api = Rc::new(FakeApi::new());
        let first_rec = api.recommend.defer();
        let second_rec = api.recommend.defer();
        let first_prev = api.previous.defer();
        let second_prev = api.previous.defer();
        let refresher = RecommendationRefresher::new(api.clone(), EventBus::new());

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        spawner.spawn_local(refresher.refresh("u1", "e1", None)).unwrap();
        pool.run_until_stalled();
        spawner.spawn_local(refresher.refresh("u1", "e1", None)).unwrap();
        pool.run_until_stalled();

        // Newer answers arrive first, stale ones afterwards.
        second_rec.send(Ok(recommendation(110.0))).unwrap();
        second_prev.send(Ok(previous(105.0))).unwrap();
        pool.run_until_stalled();
        first_rec.send(Ok(recommendation(90.0))).unwrap();
        first_prev.send(Ok(Comparison::NoPriorData)).unwrap();
        pool.run_until_stalled();

        let board = refresher.board();
        assert_eq!(board.recommendation, Feed::Ready(recommendation(110.0)));
        assert_eq!(board.comparison, Feed::Ready(previous(105.0)));
    }

    #[test]
    fn stale_result_never_lands_even_if_it_arrives_first() {
        let api = Rc::new(FakeApi::new());
        let first_rec = api.recommend.defer();
        let second_rec = api.recommend.defer();
        api.previous.reply(Ok(Comparison::NoPriorData));
        api.previous.reply(Ok(Comparison::NoPriorData));
        let refresher = RecommendationRefresher::new(api.clone(), EventBus::new());

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        spawner.spawn_local(refresher.refresh("u1", "e1", None)).unwrap();
        pool.run_until_stalled();
        spawner.spawn_local(refresher.refresh("u1", "e1", None)).unwrap();
        pool.run_until_stalled();

        first_rec.send(Ok(recommendation(90.0))).unwrap();
        pool.run_until_stalled();
        assert_eq!(refresher.board().recommendation, Feed::Loading);

        second_rec.send(Ok(recommendation(110.0))).unwrap();
        pool.run_until_stalled();
        assert_eq!(
            refresher.board().recommendation,
            Feed::Ready(recommendation(110.0))
        );
    }

    #[test]
    fn missing_progression_is_computed_locally() {
        let api = Rc::new(FakeApi::new());
        api.recommend.reply(Ok(recommendation(100.0)));
        api.previous.reply(Ok(previous(100.0)));
        let refresher = RecommendationRefresher::new(api.clone(), EventBus::new());

        block_on(refresher.refresh("u1", "e1", Some(test_set("a", 1, 105.0, 1))));

        match refresher.board().comparison {
            Feed::Ready(Comparison::Previous(p)) => {
                assert_eq!(p.progression_metric_string.as_deref(), Some("+5.0 kg e1RM (+5.0%)"));
                assert_eq!(p.is_positive_progression, Some(true));
            }
            other => panic!("unexpected comparison: {:?}", other),
        }
    }
}
