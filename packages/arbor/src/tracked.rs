use crate::{BarId, Producer};

/// Iterator adapter that shows its progress as a bar.
///
/// The bar is created when the first item is requested and removed when the
/// adapter is dropped, including when the loop exits early. An item is
/// counted when the next one is requested, that is after the loop body is
/// done with it. An item cut short by an early exit is not counted. The total is the exact length of the inner
/// iterator if it is known, otherwise the bar has an unknown total.
///
/// ```rust,no_run
/// # use pistonite_arbor as arbor;
/// # fn main() -> arbor::Result<()> {
/// let session = arbor::Session::start(arbor::Config::default())?;
/// let bars = session.producer();
/// let epochs = arbor::Tracked::new(0..3, &bars, "epochs");
/// let epoch_id = epochs.id();
/// for _ in epochs {
///     for _ in arbor::Tracked::new(0..100, &bars, "batches").child_of(epoch_id) {
///         // ...
///     }
/// }
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Tracked<I> {
    inner: I,
    producer: Producer,
    id: BarId,
    label: String,
    parent: Option<BarId>,
    total: Option<i64>,
    started: bool,
    /// An item was handed out and is not counted yet
    pending: bool,
}

impl<I: Iterator> Tracked<I> {
    /// Wrap an iterator. The id of the bar is allocated right away
    pub fn new(inner: I, producer: &Producer, label: impl Into<String>) -> Self {
        Self {
            inner,
            producer: producer.clone(),
            id: crate::next_bar_id(),
            label: label.into(),
            parent: None,
            total: None,
            started: false,
            pending: false,
        }
    }

    /// Nest the bar under another bar
    pub fn child_of(mut self, parent: BarId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Override the total instead of using the length of the iterator
    pub fn total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }

    /// Id of the bar, to nest other bars under
    #[inline(always)]
    pub fn id(&self) -> BarId {
        self.id
    }

    /// Advance the bar by `n` without yielding items
    pub fn update(&mut self, n: i64) {
        self.ensure_started();
        self.producer.advance(self.id, n);
    }

    fn ensure_started(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let total = self.total.unwrap_or_else(|| match self.inner.size_hint() {
            (lower, Some(upper)) if lower == upper => i64::try_from(lower).unwrap_or(0),
            _ => 0,
        });
        let label = std::mem::take(&mut self.label);
        match self.parent {
            Some(parent) => self.producer.create_child(self.id, total, label, parent),
            None => self.producer.create(self.id, total, label),
        }
    }
}

impl<I: Iterator> Iterator for Tracked<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.ensure_started();
        if std::mem::take(&mut self.pending) {
            self.producer.advance(self.id, 1);
        }
        let item = self.inner.next()?;
        self.pending = true;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I> Drop for Tracked<I> {
    fn drop(&mut self) {
        if self.started {
            self.producer.remove(self.id);
        }
    }
}
