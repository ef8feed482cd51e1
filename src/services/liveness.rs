// src/services/liveness.rs
//
// Session liveness tokens.
//
// Every mount advances a shared counter; async completions carry the token
// they were started under and drop their result once it is no longer
// current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return its token
    pub fn advance(&self) -> Liveness {
        let generation = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Liveness {
            generation,
            counter: self.clone(),
        }
    }

    /// Retire the current generation without starting a session
    pub fn invalidate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Token held by one session and everything it spawns
#[derive(Debug, Clone)]
pub struct Liveness {
    generation: u64,
    counter: GenerationCounter,
}

impl Liveness {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.counter.current() == self.generation
    }
}
