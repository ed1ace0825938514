use evalexpr::{
    build_operator_tree, ContextWithMutableVariables, DefaultNumericTypes, HashMapContext,
    Node,
};

use crate::{blackboard::Blackboard, error::BlackboardError, owner::Owner, value::Value};

use super::Condition;

/// Boolean `evalexpr` expression whose identifiers name blackboard
/// variables, e.g. `health < 30 && !fleeing`.
#[derive(Debug, Clone)]
pub struct ExpressionCondition {
    source: String,
    expr: Node<DefaultNumericTypes>,
}

impl ExpressionCondition {
    pub fn new(source: impl Into<String>) -> Result<Self, BlackboardError> {
        let source = source.into();
        let expr = build_operator_tree::<DefaultNumericTypes>(&source)
            .map_err(|error| BlackboardError::Expression(format!("'{source}': {error}")))?;

        Ok(Self { source, expr })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate_with(&self, blackboard: &Blackboard) -> Result<bool, BlackboardError> {
        let mut context = HashMapContext::<DefaultNumericTypes>::new();

        for name in self.expr.iter_variable_identifiers() {
            let value = blackboard
                .value_by_name(name)
                .ok_or_else(|| BlackboardError::NotFound(name.to_owned()))?;
            let value = to_expression_value(&value).ok_or_else(|| {
                BlackboardError::Expression(format!(
                    "variable '{name}' of kind {} cannot be used in '{}'",
                    value.kind(),
                    self.source
                ))
            })?;

            context
                .set_value(name.to_owned(), value)
                .map_err(|error| BlackboardError::Expression(error.to_string()))?;
        }

        self.expr
            .eval_boolean_with_context(&context)
            .map_err(|error| BlackboardError::Expression(format!("'{}': {error}", self.source)))
    }
}

fn to_expression_value(value: &Value) -> Option<evalexpr::Value<DefaultNumericTypes>> {
    Some(match value {
        Value::Integer(value) => evalexpr::Value::Int(*value),
        Value::Float(value) => evalexpr::Value::Float(*value),
        Value::String(value) => evalexpr::Value::String(value.clone()),
        Value::Boolean(value) => evalexpr::Value::Boolean(*value),
        Value::Vec(values) => evalexpr::Value::Tuple(
            values
                .iter()
                .map(to_expression_value)
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Dynamic(value) => evalexpr::Value::String(value.dyn_as_string()?),
    })
}

impl Condition for ExpressionCondition {
    fn evaluate(&mut self, owner: &Owner) -> bool {
        match self.evaluate_with(owner.blackboard()) {
            Ok(outcome) => outcome,
            Err(error) => {
                log::warn!("owner '{}': condition evaluated false: {error}", owner.name());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn blackboard() -> Blackboard {
        let blackboard = Blackboard::create();
        blackboard.declare("health", 25);
        blackboard.declare("speed", 1.5);
        blackboard.declare("alerted", true);
        blackboard.declare("mode", "patrol");
        blackboard
    }

    #[rstest]
    #[case::integer("health < 30", true)]
    #[case::float("speed * 2.0 > 4.0", false)]
    #[case::boolean("alerted && health > 0", true)]
    #[case::string("mode == \"patrol\"", true)]
    #[case::constant("false", false)]
    fn evaluates_against_blackboard(#[case] source: &str, #[case] expected: bool) {
        let condition = ExpressionCondition::new(source).unwrap();
        assert_eq!(condition.evaluate_with(&blackboard()).unwrap(), expected);
    }

    #[test]
    fn missing_variable_is_reported() {
        let condition = ExpressionCondition::new("ammo > 0").unwrap();
        assert!(matches!(
            condition.evaluate_with(&blackboard()),
            Err(BlackboardError::NotFound(name)) if name == "ammo"
        ));
    }

    #[rstest]
    #[case::unclosed("(health < 3")]
    #[case::unopened("health < 3)")]
    fn unbalanced_expression_is_rejected(#[case] source: &str) {
        assert!(matches!(
            ExpressionCondition::new(source),
            Err(BlackboardError::Expression(_))
        ));
    }

    #[test]
    fn failed_evaluation_is_false() {
        let owner = Owner::new("guard");
        let mut condition = ExpressionCondition::new("health + 1").unwrap();
        owner.blackboard().declare("health", 3);

        assert!(!condition.evaluate(&owner));
    }
}
