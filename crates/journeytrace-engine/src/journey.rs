//! Journey stack: the call-stack of journey contexts.
//!
//! The bottom context is the root journey, established once from the first
//! headers clip carrying a policy id. Sub-journey contexts are pushed when a
//! dispatch handler fires and popped on explicit exit or when one of the
//! inferred-completion rules applies (see [`crate::pop_rules`]).

use crate::error::JourneyStackError;

/// One journey nesting level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyContext {
    pub journey_id: String,
    pub journey_name: String,
    /// Last orchestration counter value observed while this context was
    /// active. The counter is a single global shared by all nesting levels,
    /// so a pop writes the child's last value into the parent.
    pub last_orchestration_step: i64,
}

impl JourneyContext {
    pub fn new(journey_id: impl Into<String>, journey_name: impl Into<String>) -> JourneyContext {
        JourneyContext {
            journey_id: journey_id.into(),
            journey_name: journey_name.into(),
            last_orchestration_step: 0,
        }
    }
}

/// Non-empty stack of journey contexts.
#[derive(Debug, Clone)]
pub struct JourneyStack {
    stack: Vec<JourneyContext>,
}

impl JourneyStack {
    pub fn new(root_id: impl Into<String>, root_name: impl Into<String>) -> JourneyStack {
        JourneyStack {
            stack: vec![JourneyContext::new(root_id, root_name)],
        }
    }

    /// Drop all sub-journey contexts and zero the root counter. Called at
    /// session boundaries: a restarted journey begins counting from zero.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
        self.stack[0].last_orchestration_step = 0;
    }

    pub fn root(&self) -> &JourneyContext {
        &self.stack[0]
    }

    pub fn current(&self) -> &JourneyContext {
        self.stack.last().expect("journey stack is never empty")
    }

    pub fn push(&mut self, context: JourneyContext) {
        self.stack.push(context);
    }

    /// Pop the current sub-journey. The parent absorbs the child's last
    /// counter value. Popping past the root is an error, not a no-op: it
    /// means an upstream pop-count computation went wrong.
    pub fn pop(&mut self) -> Result<JourneyContext, JourneyStackError> {
        if self.stack.len() == 1 {
            return Err(JourneyStackError::PopPastRoot {
                journey_id: self.stack[0].journey_id.clone(),
            });
        }
        let child = self.stack.pop().expect("depth checked above");
        let parent = self.stack.last_mut().expect("journey stack is never empty");
        parent.last_orchestration_step = child.last_orchestration_step;
        Ok(child)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_in_sub_journey(&self) -> bool {
        self.stack.len() > 1
    }

    /// Bottom-to-top snapshot for ancestor scanning.
    pub fn full_stack(&self) -> &[JourneyContext] {
        &self.stack
    }

    /// Record the orchestration counter on the current context.
    pub fn update_orch_step(&mut self, step: i64) {
        self.stack
            .last_mut()
            .expect("journey stack is never empty")
            .last_orchestration_step = step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_inherits_the_child_counter() {
        let mut stack = JourneyStack::new("B2C_1A_signup", "signup");
        stack.update_orch_step(2);
        stack.push(JourneyContext::new("PasswordReset", "PasswordReset"));
        stack.update_orch_step(5);

        let popped = stack.pop().expect("one sub-journey to pop");
        assert_eq!(popped.journey_id, "PasswordReset");
        assert_eq!(stack.current().last_orchestration_step, 5);
        assert!(!stack.is_in_sub_journey());
    }

    #[test]
    fn pop_past_root_is_an_error() {
        let mut stack = JourneyStack::new("B2C_1A_signup", "signup");
        let err = stack.pop().expect_err("root must not pop");
        assert!(err.to_string().contains("pop past root"));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn reset_returns_to_a_zeroed_root() {
        let mut stack = JourneyStack::new("B2C_1A_signup", "signup");
        stack.update_orch_step(4);
        stack.push(JourneyContext::new("MFA", "MFA"));
        stack.update_orch_step(2);

        stack.reset();

        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current().journey_id, "B2C_1A_signup");
        assert_eq!(stack.current().last_orchestration_step, 0);
    }
}
