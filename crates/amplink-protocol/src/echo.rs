//! 回显匹配与重试预算
//!
//! 这两者都是纯逻辑，驱动层的协议引擎负责实际的读写与轮询。

use crate::ProtocolError;

/// 回显匹配器
///
/// 按顺序累积收到的字节，并与发送内容的对应前缀比较。
///
/// # 示例
///
/// ```rust
/// use amplink_protocol::EchoMatcher;
///
/// let mut matcher = EchoMatcher::new(b"UUUUUU");
/// matcher.feed(b"UU").unwrap();
/// assert_eq!(matcher.remaining(), 4);
/// matcher.feed(b"UUUU").unwrap();
/// assert!(matcher.is_complete());
/// ```
#[derive(Debug, Clone)]
pub struct EchoMatcher<'a> {
    expected: &'a [u8],
    matched: usize,
}

impl<'a> EchoMatcher<'a> {
    /// 创建匹配器
    pub fn new(expected: &'a [u8]) -> Self {
        Self {
            expected,
            matched: 0,
        }
    }

    /// 还需要收到的字节数
    #[inline]
    pub fn remaining(&self) -> usize {
        self.expected.len() - self.matched
    }

    /// 已匹配的字节数
    #[inline]
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// 是否已收到完整回显
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.matched == self.expected.len()
    }

    /// 输入新收到的字节
    ///
    /// 任何一个字节不一致立即返回 `EchoMismatch`，匹配器状态保持不变。
    pub fn feed(&mut self, received: &[u8]) -> Result<(), ProtocolError> {
        if received.len() > self.remaining() {
            return Err(ProtocolError::EchoOverflow {
                received: received.len(),
                remaining: self.remaining(),
            });
        }

        let window = &self.expected[self.matched..self.matched + received.len()];
        if let Some(pos) = window.iter().zip(received).position(|(e, a)| e != a) {
            return Err(ProtocolError::EchoMismatch {
                offset: self.matched + pos,
                expected: window[pos],
                actual: received[pos],
            });
        }

        self.matched += received.len();
        Ok(())
    }
}

/// 重试预算
///
/// 每次命令调用重新创建，每次带超时的轮询消耗一次（包括超时）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    initial: u32,
    remaining: u32,
}

impl RetryBudget {
    pub const fn new(attempts: u32) -> Self {
        Self {
            initial: attempts,
            remaining: attempts,
        }
    }

    /// 尝试消耗一次预算，预算耗尽时返回 false
    #[inline]
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// 剩余次数
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// 已使用次数
    #[inline]
    pub fn used(&self) -> u32 {
        self.initial - self.remaining
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_matcher_byte_by_byte() {
        let mut matcher = EchoMatcher::new(b"DDDDDD");
        for i in 0..6 {
            assert!(!matcher.is_complete());
            matcher.feed(b"D").unwrap();
            assert_eq!(matcher.matched(), i + 1);
        }
        assert!(matcher.is_complete());
        assert_eq!(matcher.remaining(), 0);
    }

    #[test]
    fn test_matcher_mismatch_reports_offset() {
        let mut matcher = EchoMatcher::new(b"UUUUUU");
        matcher.feed(b"UUU").unwrap();
        let err = matcher.feed(b"UD").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::EchoMismatch {
                offset: 4,
                expected: b'U',
                actual: b'D',
            }
        );
        // 失败不推进状态
        assert_eq!(matcher.matched(), 3);
    }

    #[test]
    fn test_matcher_overflow() {
        let mut matcher = EchoMatcher::new(b"A");
        assert!(matches!(
            matcher.feed(b"AA"),
            Err(ProtocolError::EchoOverflow {
                received: 2,
                remaining: 1
            })
        ));
    }

    #[test]
    fn test_matcher_empty_feed() {
        let mut matcher = EchoMatcher::new(b"A");
        matcher.feed(&[]).unwrap();
        assert_eq!(matcher.remaining(), 1);
    }

    #[test]
    fn test_retry_budget() {
        let mut budget = RetryBudget::new(3);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert!(budget.is_exhausted());
        assert_eq!(budget.used(), 3);
    }

    #[test]
    fn test_zero_budget() {
        let mut budget = RetryBudget::new(0);
        assert!(!budget.try_consume());
        assert_eq!(budget.used(), 0);
    }

    proptest! {
        /// 任意切分方式下，正确的回显总能完整匹配
        #[test]
        fn prop_any_chunking_matches(
            payload in proptest::collection::vec(any::<u8>(), 1..32),
            cuts in proptest::collection::vec(1usize..8, 0..32),
        ) {
            let mut matcher = EchoMatcher::new(&payload);
            let mut offset = 0;
            for cut in cuts {
                if offset >= payload.len() {
                    break;
                }
                let end = (offset + cut).min(payload.len());
                matcher.feed(&payload[offset..end]).unwrap();
                offset = end;
            }
            if offset < payload.len() {
                matcher.feed(&payload[offset..]).unwrap();
            }
            prop_assert!(matcher.is_complete());
        }

        /// 任何一个字节被篡改都会被检出
        #[test]
        fn prop_corruption_detected(
            payload in proptest::collection::vec(any::<u8>(), 1..32),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let pos = index.index(payload.len());
            let mut echoed = payload.clone();
            echoed[pos] ^= flip;

            let mut matcher = EchoMatcher::new(&payload);
            let result = matcher.feed(&echoed);
            prop_assert!(
                matches!(result, Err(ProtocolError::EchoMismatch { offset, .. }) if offset == pos),
                "unexpected result: {:?}",
                result
            );
        }
    }
}
