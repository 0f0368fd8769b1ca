use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

/// An atomic wrapper with an underlying atomic storage and conversion to
/// a type T.
///
/// `Acquire` ordering is used for load and `Release` ordering is used for store.
///
/// ```rust
/// # use pistonite_arbor as arbor;
/// use arbor::LoopState;
///
/// let value: arbor::Atomic<u8, LoopState> = arbor::Atomic::new_u8(LoopState::Running as u8);
/// assert_eq!(LoopState::Running, value.get());
/// value.set(LoopState::Stopped);
/// assert_eq!(LoopState::Stopped, value.get());
/// ```
#[derive(Debug, Default)]
pub struct Atomic<S, T>(S::Type, std::marker::PhantomData<T>)
where
    S: AtomicType,
    T: From<S> + Into<S>;
/// Marker type to associate primitive with their atomic versions
pub trait AtomicType {
    type Type;
}
macro_rules! impl_atomic_type {
    ($($t:ident => $Atomic:ident, $newfn:ident),* $(,)?) => { $(
    impl AtomicType for $t {
        type Type = std::sync::atomic::$Atomic;
    }
    impl<T: From<$t> + Into<$t>> Atomic<$t, T> {
        pub const fn $newfn(value: $t) -> Self {
            Self(std::sync::atomic::$Atomic::new(value), std::marker::PhantomData)
        }
        pub fn get(&self) -> T {
            self.0.load(std::sync::atomic::Ordering::Acquire).into()
        }
        pub fn set(&self, value: T) {
            self.0.store(value.into(), std::sync::atomic::Ordering::Release)
        }
    }
    )* }
}
impl_atomic_type! {
    u8 => AtomicU8, new_u8,
}

/// Allocate a bar id that has not been handed out by this process yet.
///
/// Ids start at 1 so they never collide with the negative "no parent"
/// sentinel used by [`RawEvent`](crate::RawEvent).
pub fn next_bar_id() -> crate::BarId {
    static ID: AtomicI64 = AtomicI64::new(1);
    ID.fetch_add(1, Ordering::SeqCst)
}

/// Get a process-unique number, used to tell handles apart
pub(crate) fn next_atomic_usize() -> usize {
    static ID: AtomicUsize = AtomicUsize::new(1);
    ID.fetch_add(1, Ordering::SeqCst)
}
