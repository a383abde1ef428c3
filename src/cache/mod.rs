//! Best-effort answer cache: exact normalized-question hits plus
//! near-duplicate hits by token-set Jaccard over recent answers.

pub mod expiring;
pub mod similarity;

pub use expiring::ExpiringMap;
pub use similarity::{jaccard, normalize_question, tokens};

use crate::config::CacheConfig;
use crate::tutor::types::TutorAnswer;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use strum::Display;

// CacheHitKind — which lookup path satisfied a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CacheHitKind {
    Exact,
    Similar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub answer: TutorAnswer,
    pub kind: CacheHitKind,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct RecentEntry {
    tokens: BTreeSet<String>,
    answer: TutorAnswer,
}

#[derive(Debug, Default)]
struct CacheState {
    exact: ExpiringMap<String, TutorAnswer>,
    recent: VecDeque<RecentEntry>,
    /// The recency buffer shares one deadline, refreshed on every write.
    recent_deadline: Option<Instant>,
}

impl CacheState {
    fn recent_live(&mut self, now: Instant) -> bool {
        match self.recent_deadline {
            Some(deadline) if deadline > now => true,
            _ => {
                self.recent.clear();
                self.recent_deadline = None;
                false
            }
        }
    }
}

pub struct AnswerCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    similarity_threshold: f64,
    recent_capacity: usize,
}

impl AnswerCache {
    pub fn new(ttl: Duration, similarity_threshold: f64, recent_capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
            similarity_threshold,
            recent_capacity: recent_capacity.max(1),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.ttl(),
            config.similarity_threshold,
            config.recent_capacity,
        )
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, question: &str) -> Option<TutorAnswer> {
        self.lookup(question).map(|hit| hit.answer)
    }

    /// Exact key first, then the best recent entry at or above the threshold.
    pub fn lookup(&self, question: &str) -> Option<CacheHit> {
        let normalized = normalize_question(question);
        let mut state = self.lock();

        if let Some(answer) = state.exact.get(&normalized) {
            return Some(CacheHit {
                answer,
                kind: CacheHitKind::Exact,
                score: 1.0,
            });
        }

        if !state.recent_live(Instant::now()) {
            return None;
        }
        let query = tokens(&normalized);
        let (best, score) = state
            .recent
            .iter()
            .map(|entry| (entry, jaccard(&query, &entry.tokens)))
            .fold(None::<(&RecentEntry, f64)>, |best, (entry, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((entry, score)),
            })?;
        if score >= self.similarity_threshold {
            tracing::debug!(score, "near-duplicate cache hit");
            Some(CacheHit {
                answer: best.answer.clone(),
                kind: CacheHitKind::Similar,
                score,
            })
        } else {
            None
        }
    }

    pub fn put(&self, question: &str, answer: TutorAnswer) {
        let normalized = normalize_question(question);
        let entry = RecentEntry {
            tokens: tokens(&normalized),
            answer: answer.clone(),
        };
        let mut state = self.lock();
        state.exact.insert(normalized, answer, self.ttl);

        let now = Instant::now();
        state.recent_live(now);
        state.recent.push_back(entry);
        while state.recent.len() > self.recent_capacity {
            state.recent.pop_front();
        }
        state.recent_deadline = Some(now + self.ttl);
    }

    /// Remove expired exact entries and an expired recency buffer.
    pub fn sweep_expired(&self) -> usize {
        let mut state = self.lock();
        let mut removed = state.exact.sweep_expired();
        let buffered = state.recent.len();
        if !state.recent_live(Instant::now()) {
            removed += buffered;
        }
        removed
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.exact.clear();
        state.recent.clear();
        state.recent_deadline = None;
    }

    /// Live-or-unswept exact entries.
    pub fn len(&self) -> usize {
        self.lock().exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
