/// Remote calls one identity may make during a session. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBudget {
    pub identity: String,
    pub used: u32,
    pub max: u32,
}

impl QueryBudget {
    pub fn new(identity: impl Into<String>, max: u32) -> Self {
        Self {
            identity: identity.into(),
            used: 0,
            max,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    pub(crate) fn record_call(&mut self) {
        self.used = self.used.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_counts_down_to_zero() {
        let mut budget = QueryBudget::new("alice", 2);
        assert_eq!(budget.remaining(), 2);
        budget.record_call();
        budget.record_call();
        assert!(budget.is_exhausted());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_zero_budget_is_exhausted_immediately() {
        assert!(QueryBudget::new("nobody", 0).is_exhausted());
    }
}
