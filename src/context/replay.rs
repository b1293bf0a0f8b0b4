use crate::{error::Error, Result};

/// A sliding window over received sequence numbers.
///
/// Bit `n % size` stands for sequence number `n` as long as `n` is inside
/// the window, which covers the `size` numbers ending at the highest one
/// accepted so far.
#[derive(Debug)]
pub struct ReplayWindow {
    size: u64,
    bits: Vec<u64>,
    highest: Option<u64>,
}

impl ReplayWindow {
    /// Creates an empty window. `size` must not be zero.
    pub fn new(size: usize) -> ReplayWindow {
        ReplayWindow {
            size: size as u64,
            bits: vec![0; (size + 63) / 64],
            highest: None,
        }
    }

    /// Returns the highest sequence number accepted so far.
    pub fn highest(&self) -> Option<u64> {
        self.highest
    }

    /// Returns whether `seq` would be accepted.
    pub fn check(&self, seq: u64) -> bool {
        match self.highest {
            None => true,
            Some(highest) if seq > highest => true,
            // At or below the lower edge
            Some(highest) if highest - seq >= self.size => false,
            Some(_) => !self.is_marked(seq),
        }
    }

    /// Accepts `seq` and marks it as seen, unless it's a replay.
    pub fn check_and_mark(&mut self, seq: u64) -> Result<()> {
        if !self.check(seq) {
            return Err(Error::ReplayDetected);
        }

        match self.highest {
            Some(highest) if seq <= highest => (),
            Some(highest) if seq - highest < self.size => {
                // Forget the numbers whose slots the advance reuses
                for slot in highest + 1..seq {
                    self.unmark(slot);
                }
                self.highest = Some(seq);
            }
            _ => {
                // The whole window moves past everything that was marked
                self.bits.iter_mut().for_each(|word| *word = 0);
                self.highest = Some(seq);
            }
        }
        self.mark(seq);

        Ok(())
    }

    fn slot(&self, seq: u64) -> (usize, u64) {
        let index = (seq % self.size) as usize;
        (index / 64, 1 << (index % 64))
    }

    fn is_marked(&self, seq: u64) -> bool {
        let (word, mask) = self.slot(seq);
        self.bits[word] & mask != 0
    }

    fn mark(&mut self, seq: u64) {
        let (word, mask) = self.slot(seq);
        self.bits[word] |= mask;
    }

    fn unmark(&mut self, seq: u64) {
        let (word, mask) = self.slot(seq);
        self.bits[word] &= !mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates() {
        let mut window = ReplayWindow::new(32);
        assert!(window.check_and_mark(0).is_ok());
        assert!(matches!(
            window.check_and_mark(0),
            Err(Error::ReplayDetected)
        ));
        assert!(window.check_and_mark(1).is_ok());
        assert!(window.check_and_mark(1).is_err());
        assert_eq!(Some(1), window.highest());
    }

    #[test]
    fn out_of_order() {
        let mut window = ReplayWindow::new(32);
        assert!(window.check_and_mark(10).is_ok());
        assert!(window.check_and_mark(5).is_ok());
        assert!(window.check_and_mark(7).is_ok());
        // An older number inside the window doesn't move the edge
        assert_eq!(Some(10), window.highest());
        assert!(window.check_and_mark(5).is_err());
        assert!(window.check_and_mark(6).is_ok());
    }

    #[test]
    fn lower_edge() {
        let mut window = ReplayWindow::new(32);
        assert!(window.check_and_mark(40).is_ok());
        // 40 - 32 = 8 is at the lower edge
        assert!(!window.check(8));
        assert!(window.check(9));
        assert!(window.check_and_mark(3).is_err());
        assert!(window.check_and_mark(9).is_ok());
    }

    #[test]
    fn advance_reuses_slots() {
        let mut window = ReplayWindow::new(4);
        for seq in 0..4 {
            assert!(window.check_and_mark(seq).is_ok());
        }
        // Slot of 0 now belongs to 4, 0 itself fell out of the window
        assert!(window.check_and_mark(4).is_ok());
        assert!(window.check_and_mark(0).is_err());
        assert!(window.check_and_mark(4).is_err());
        assert!(window.check_and_mark(3).is_err());
        // Jump far ahead, clearing everything
        assert!(window.check_and_mark(100).is_ok());
        assert!(window.check_and_mark(98).is_ok());
        assert!(window.check_and_mark(4).is_err());
    }

    #[test]
    fn large_window() {
        let mut window = ReplayWindow::new(200);
        for seq in (0..400).step_by(3) {
            assert!(window.check_and_mark(seq).is_ok());
        }
        assert!(window.check_and_mark(399).is_err());
        assert!(window.check_and_mark(398).is_ok());
        assert!(window.check_and_mark(200).is_ok());
        assert!(window.check_and_mark(199).is_err());
    }
}
