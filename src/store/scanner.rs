//! Merging scan driver.
//!
//! [`CellHeap`] merges several [`CellSource`]s into one stream in scan
//! order. [`StoreScanner`] drives a [`CellMatcher`] over such a stream and
//! yields the cells the matcher includes, acting on its seek decisions.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    cell::{Cell, SeekKey},
    error::ScanError,
    logging::basalt_log,
    matcher::{CellMatcher, MatchCode},
    store::CellSource,
};

/// Heap entry: one buffered cell plus the index of the source it came from.
struct Ranked {
    offset: usize,
    cell: Cell,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the least key; ties go to the
        // earlier source.
        self.cell
            .scan_cmp(&other.cell)
            .then_with(|| self.offset.cmp(&other.offset))
            .reverse()
    }
}

/// K-way merge of [`CellSource`]s, itself a [`CellSource`].
///
/// Each underlying source contributes at most one buffered cell; seeking
/// repositions every source and rebuilds the buffer.
pub struct CellHeap<S> {
    sources: Vec<S>,
    heap: BinaryHeap<Ranked>,
}

impl<S> CellHeap<S>
where
    S: CellSource,
{
    /// Merge `sources`; on equal cell coordinates the earlier source wins.
    pub fn new(sources: Vec<S>) -> Self {
        let mut merged = Self {
            sources,
            heap: BinaryHeap::new(),
        };
        merged.prime();
        merged
    }

    fn prime(&mut self) {
        self.heap.clear();
        for (offset, source) in self.sources.iter_mut().enumerate() {
            if let Some(cell) = source.next_cell() {
                self.heap.push(Ranked { offset, cell });
            }
        }
    }
}

impl<S> CellSource for CellHeap<S>
where
    S: CellSource,
{
    fn peek(&self) -> Option<&Cell> {
        self.heap.peek().map(|ranked| &ranked.cell)
    }

    fn next_cell(&mut self) -> Option<Cell> {
        let Ranked { offset, cell } = self.heap.pop()?;
        if let Some(refill) = self.sources[offset].next_cell() {
            self.heap.push(Ranked {
                offset,
                cell: refill,
            });
        }
        Some(cell)
    }

    fn seek(&mut self, target: &SeekKey) {
        for source in &mut self.sources {
            source.seek(target);
        }
        self.prime();
    }
}

/// What the driver does next, planned while peeking at the stream.
enum Action {
    Emit,
    EmitThenSeek(SeekKey),
    EmitThenFinish,
    Advance,
    Seek(SeekKey),
    Finish,
    Fail(ScanError),
}

/// Iterator over the cells a scan keeps.
///
/// Yields `Err` once and then ends if the underlying stream violates scan
/// order.
pub struct StoreScanner<S> {
    source: S,
    matcher: CellMatcher,
    finished: bool,
}

impl<S> StoreScanner<S>
where
    S: CellSource,
{
    /// Drive `matcher` over `source`, seeking to the scan's start row
    /// first.
    pub fn new(mut source: S, matcher: CellMatcher) -> Self {
        if let Some(start) = matcher.start_key() {
            source.seek(&start);
        }
        Self {
            source,
            matcher,
            finished: false,
        }
    }

    fn plan(&mut self) -> Action {
        let Some(peeked) = self.source.peek() else {
            return Action::Finish;
        };

        match self.matcher.current_row() {
            Some(row) if peeked.row() == row => {}
            // Rebinding only moves forward; a regressed row stays foreign
            // and the matcher faults it below.
            Some(row) if peeked.row() < row => {}
            _ => {
                if !self.matcher.more_rows_may_exist_after(peeked) {
                    return Action::Finish;
                }
                self.matcher.set_row(peeked.row().clone());
            }
        }

        let code = match self.matcher.match_cell(peeked) {
            Ok(code) => code,
            Err(err) => return Action::Fail(err),
        };

        match code {
            MatchCode::Include => Action::Emit,
            MatchCode::Skip | MatchCode::Next => Action::Advance,
            MatchCode::Done => Action::Fail(ScanError::OutOfOrderCell {
                context: "scan driver",
                qualifier: peeked.qualifier().clone(),
            }),
            MatchCode::DoneScan => Action::Finish,
            MatchCode::SeekNextCol => Action::Seek(self.matcher.key_for_next_column(peeked)),
            MatchCode::SeekNextRow => {
                if self.matcher.more_rows_may_exist_after(peeked) {
                    Action::Seek(self.matcher.key_for_next_row(peeked))
                } else {
                    Action::Finish
                }
            }
            MatchCode::SeekNextUsingHint => match self.matcher.next_key_hint(peeked) {
                Some(target) => Action::Seek(target),
                None => Action::Advance,
            },
            MatchCode::IncludeAndSeekNextCol => {
                Action::EmitThenSeek(self.matcher.key_for_next_column(peeked))
            }
            MatchCode::IncludeAndSeekNextRow => {
                if self.matcher.more_rows_may_exist_after(peeked) {
                    Action::EmitThenSeek(self.matcher.key_for_next_row(peeked))
                } else {
                    Action::EmitThenFinish
                }
            }
        }
    }
}

impl<S> StoreScanner<CellHeap<S>>
where
    S: CellSource,
{
    /// Convenience for scanning several sources merged in scan order.
    pub fn merged(sources: Vec<S>, matcher: CellMatcher) -> Self {
        Self::new(CellHeap::new(sources), matcher)
    }
}

impl<S> Iterator for StoreScanner<S>
where
    S: CellSource,
{
    type Item = Result<Cell, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.plan() {
                Action::Emit => return self.source.next_cell().map(Ok),
                Action::EmitThenSeek(target) => {
                    let cell = self.source.next_cell();
                    self.source.seek(&target);
                    return cell.map(Ok);
                }
                Action::EmitThenFinish => {
                    self.finished = true;
                    return self.source.next_cell().map(Ok);
                }
                Action::Advance => {
                    self.source.next_cell();
                }
                Action::Seek(target) => {
                    basalt_log!(log::Level::Trace, "scan_seek", "target={:?}", target);
                    self.source.seek(&target);
                }
                Action::Finish => {
                    self.finished = true;
                    basalt_log!(log::Level::Trace, "scan_done", "scan finished");
                    return None;
                }
                Action::Fail(err) => {
                    self.finished = true;
                    basalt_log!(log::Level::Error, "scan_failed", "err={}", err);
                    return Some(Err(err));
                }
            }
        }
    }
}
