// src/session.rs
//! End-to-end handling of one generation response: wipe old highlights,
//! restart the palette, paint the new conflicts and persist the hue.

use crate::color::ColorCounter;
use crate::config::HighlightConfig;
use crate::counter_store::{update_color_counter, CounterStore};
use crate::document::HighlightDocument;
use crate::engine::{HighlightEngine, HighlightReport};
use crate::models::GenerationResponse;

pub struct HighlightSession<'a, S: CounterStore + ?Sized> {
    config: &'a HighlightConfig,
    store: &'a S,
}

impl<'a, S: CounterStore + ?Sized> HighlightSession<'a, S> {
    pub fn new(config: &'a HighlightConfig, store: &'a S) -> Self {
        Self { config, store }
    }

    /// Apply a response to `doc`. Never fails: per-item problems are counted
    /// in the report and store problems are logged.
    ///
    /// The pass runs inside the store's atomic counter update, so the hue
    /// read at the start and the hue written at the end belong to this pass.
    pub fn run<D: HighlightDocument + ?Sized>(
        &self,
        doc: &mut D,
        response: &GenerationResponse,
    ) -> HighlightReport {
        let key = &self.config.counter_key;
        let mut report = None;

        let persisted = update_color_counter(self.store, key, |counter| {
            let (pass_report, next) = self.pass(&mut *doc, response, counter);
            report = Some(pass_report);
            next
        });

        if let Err(err) = &persisted {
            log::warn!("counter {:?} not persisted: {}", key, err);
        }

        // Store unavailable before the pass ran: highlight from hue 0 anyway
        let report =
            report.unwrap_or_else(|| self.pass(doc, response, ColorCounter::default()).0);

        log::info!(
            "applied {} conflict pairs, {} items skipped",
            report.pairs_processed,
            report.skipped()
        );
        report
    }

    fn pass<D: HighlightDocument + ?Sized>(
        &self,
        doc: &mut D,
        response: &GenerationResponse,
        counter: ColorCounter,
    ) -> (HighlightReport, ColorCounter) {
        let mut engine = HighlightEngine::from_config(self.config, counter);

        let cleared = HighlightEngine::clear_all(&mut *doc);
        log::debug!("cleared {} text spans", cleared);

        let report = engine.apply_raw(doc, response.conflicts.as_ref());
        (report, engine.counter())
    }
}
