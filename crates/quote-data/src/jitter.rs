//! soft TTL jitter 선택.

use rand::Rng;

/// 레코드 기록 시점의 jitter(초)를 고릅니다.
pub trait JitterSource: Send + Sync {
    fn jitter_secs(&self) -> u32;
}

/// `0..=max` 구간에서 균등하게 고르는 jitter.
#[derive(Debug, Clone, Copy)]
pub struct RandomJitter {
    max_secs: u32,
}

impl RandomJitter {
    pub fn new(max_secs: u32) -> Self {
        Self { max_secs }
    }
}

impl JitterSource for RandomJitter {
    fn jitter_secs(&self) -> u32 {
        rand::thread_rng().gen_range(0..=self.max_secs)
    }
}

/// 항상 같은 값을 돌려주는 jitter (테스트용).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub u32);

impl JitterSource for FixedJitter {
    fn jitter_secs(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_jitter_in_range() {
        let jitter = RandomJitter::new(300);
        for _ in 0..1_000 {
            assert!(jitter.jitter_secs() <= 300);
        }
    }

    #[test]
    fn test_zero_max() {
        assert_eq!(RandomJitter::new(0).jitter_secs(), 0);
        assert_eq!(FixedJitter(17).jitter_secs(), 17);
    }
}
