// pipeline.rs
use crate::domain::{dedupe, normalize_all, Listing, SourceId};
use crate::scraper::{FetchOutcome, Limits, RunContext, Strategy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyStatus {
    Ok,
    Empty,
    Failed(String),
    /// Not run because the harvest was interrupted.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StrategyReport {
    pub name: &'static str,
    pub source: SourceId,
    pub raw_count: usize,
    pub kept_count: usize,
    pub status: StrategyStatus,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub listings: Vec<Listing>,
    pub strategies: Vec<StrategyReport>,
    pub duplicates_removed: usize,
    pub interrupted: bool,
}

impl PipelineReport {
    /// True when no strategy produced a usable listing.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Runs strategies one after another and merges what they find.
pub struct Pipeline<'a> {
    strategies: Vec<Strategy>,
    limits: Limits,
    ctx: RunContext<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(strategies: Vec<Strategy>, limits: Limits, ctx: RunContext<'a>) -> Self {
        Self {
            strategies,
            limits,
            ctx,
        }
    }

    pub fn run(&mut self, query: &str) -> PipelineReport {
        let mut accumulated = Vec::new();
        let mut reports = Vec::with_capacity(self.strategies.len());
        let total = self.strategies.len();

        for (i, strategy) in self.strategies.iter_mut().enumerate() {
            let name = strategy.name();
            let source = strategy.source();

            if self.ctx.cancel.is_cancelled() {
                reports.push(StrategyReport {
                    name,
                    source,
                    raw_count: 0,
                    kept_count: 0,
                    status: StrategyStatus::Skipped,
                });
                continue;
            }

            tracing::info!(strategy = name, step = i + 1, total, "running strategy");

            let (raw_count, kept, status) = match strategy.fetch(query, &self.limits, &self.ctx) {
                FetchOutcome::Records(raw) => {
                    let kept = normalize_all(&raw, &source);
                    (raw.len(), kept, StrategyStatus::Ok)
                }
                FetchOutcome::Empty => (0, Vec::new(), StrategyStatus::Empty),
                FetchOutcome::Failed(e) => {
                    tracing::warn!(strategy = name, error = %e, "strategy failed");
                    (0, Vec::new(), StrategyStatus::Failed(e.to_string()))
                }
            };

            // Records can exist yet all fail validation.
            let status = match status {
                StrategyStatus::Ok if kept.is_empty() => StrategyStatus::Empty,
                s => s,
            };

            tracing::info!(strategy = name, raw = raw_count, kept = kept.len(), "strategy done");

            reports.push(StrategyReport {
                name,
                source,
                raw_count,
                kept_count: kept.len(),
                status,
            });
            accumulated.extend(kept);
        }

        let before = accumulated.len();
        let listings = dedupe(accumulated);
        let duplicates_removed = before - listings.len();

        tracing::info!(
            total = listings.len(),
            duplicates_removed,
            "harvest finished"
        );

        PipelineReport {
            listings,
            strategies: reports,
            duplicates_removed,
            interrupted: self.ctx.cancel.is_cancelled(),
        }
    }
}
