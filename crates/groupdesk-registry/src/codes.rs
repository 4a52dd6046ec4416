//! Advisor code generation.

use std::collections::VecDeque;

use rand::Rng;

use groupdesk_core::AdvisorCode;

/// Source of candidate advisor codes. Uniqueness is checked by the store.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> AdvisorCode;
}

/// Uniform random codes from `[A-Z0-9]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> AdvisorCode {
        let mut rng = rand::thread_rng();
        let mut indices = [0usize; AdvisorCode::LEN];
        for slot in indices.iter_mut() {
            *slot = rng.gen_range(0..AdvisorCode::ALPHABET.len());
        }
        AdvisorCode::from_indices(indices)
    }
}

/// Replays a fixed list of codes, then falls back to random ones.
#[derive(Debug, Default)]
pub struct ScriptedCodeGenerator {
    queue: parking_lot::Mutex<VecDeque<AdvisorCode>>,
}

impl ScriptedCodeGenerator {
    pub fn new(codes: impl IntoIterator<Item = AdvisorCode>) -> Self {
        Self {
            queue: parking_lot::Mutex::new(codes.into_iter().collect()),
        }
    }
}

impl CodeGenerator for ScriptedCodeGenerator {
    fn generate(&self) -> AdvisorCode {
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| RandomCodeGenerator.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_codes_are_well_formed() {
        for _ in 0..100 {
            let code = RandomCodeGenerator.generate();
            assert_eq!(code.as_str().len(), AdvisorCode::LEN);
            assert!(AdvisorCode::parse(code.as_str()).is_ok());
        }
    }

    #[test]
    fn test_scripted_codes_replay_in_order() {
        let a = AdvisorCode::parse("AAAAAAAA").unwrap();
        let b = AdvisorCode::parse("BBBBBBBB").unwrap();
        let gen = ScriptedCodeGenerator::new([a.clone(), b.clone()]);
        assert_eq!(gen.generate(), a);
        assert_eq!(gen.generate(), b);
        assert_eq!(gen.generate().as_str().len(), AdvisorCode::LEN);
    }
}
