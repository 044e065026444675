//! Per-instrument pyramiding position state.

/// State of one continuous holding episode.
///
/// Owned by the caller and handed to the position manager on every bar.
/// Flat means `!held`, `entry_count == 0` and `unit_size == 0`, all at once.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    pub held: bool,
    pub entry_count: u32,
    pub entry_count_limit: u32,
    pub unit_size: f64,
    pub last_entry_price: f64,
}

impl PositionState {
    pub fn flat(entry_count_limit: u32) -> Self {
        PositionState {
            held: false,
            entry_count: 0,
            entry_count_limit,
            unit_size: 0.0,
            last_entry_price: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        !self.held
    }

    pub fn can_add(&self) -> bool {
        self.held && self.entry_count < self.entry_count_limit
    }

    /// Open a new episode with a frozen unit size.
    pub fn open(&mut self, unit_size: f64, price: f64) {
        self.held = true;
        self.entry_count = 1;
        self.unit_size = unit_size;
        self.last_entry_price = price;
    }

    /// Record a pyramid add. The unit size stays as it was at entry.
    pub fn add(&mut self, price: f64) {
        self.entry_count += 1;
        self.last_entry_price = price;
    }

    /// Back to flat defaults. The cap is configuration and survives.
    pub fn reset(&mut self) {
        *self = PositionState::flat(self.entry_count_limit);
    }

    /// Check the flat/held and cap invariants.
    pub fn is_consistent(&self) -> bool {
        let flat_fields = self.entry_count == 0 && self.unit_size == 0.0;
        let held_fields = self.entry_count >= 1 && self.unit_size > 0.0;
        let shape = if self.held { held_fields } else { flat_fields };
        shape && self.entry_count <= self.entry_count_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_flat() {
        let state = PositionState::flat(4);
        assert!(state.is_flat());
        assert_eq!(state.entry_count, 0);
        assert_eq!(state.unit_size, 0.0);
        assert!(state.is_consistent());
    }

    #[test]
    fn open_sets_episode() {
        let mut state = PositionState::flat(4);
        state.open(20.0, 1000.0);
        assert!(state.held);
        assert_eq!(state.entry_count, 1);
        assert_eq!(state.unit_size, 20.0);
        assert_eq!(state.last_entry_price, 1000.0);
        assert!(state.is_consistent());
    }

    #[test]
    fn add_keeps_unit_size() {
        let mut state = PositionState::flat(4);
        state.open(20.0, 1000.0);
        state.add(1025.0);
        assert_eq!(state.entry_count, 2);
        assert_eq!(state.unit_size, 20.0);
        assert_eq!(state.last_entry_price, 1025.0);
    }

    #[test]
    fn can_add_respects_cap() {
        let mut state = PositionState::flat(2);
        assert!(!state.can_add());
        state.open(1.0, 10.0);
        assert!(state.can_add());
        state.add(11.0);
        assert!(!state.can_add());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut state = PositionState::flat(3);
        state.open(5.0, 100.0);
        state.add(110.0);

        state.reset();
        let once = state.clone();
        state.reset();

        assert_eq!(state, once);
        assert_eq!(state, PositionState::flat(3));
    }

    #[test]
    fn inconsistent_shapes_detected() {
        let mut state = PositionState::flat(4);
        state.unit_size = 3.0;
        assert!(!state.is_consistent());

        let mut state = PositionState::flat(1);
        state.open(1.0, 1.0);
        state.entry_count = 2;
        assert!(!state.is_consistent());
    }
}
