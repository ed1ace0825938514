use std::any::Any;

/// User types stored on the blackboard as [`Value::Dynamic`].
pub trait BlackboardValue: Any + Clone + std::fmt::Debug + Send + Sync {
    /// Returns the string representation of the value. This method should return
    /// `None` if the value is not representable as a string.
    fn as_string(&self) -> Option<String> {
        None
    }
}

/// Object-safe view of a [`BlackboardValue`], implemented for every such type.
pub trait DynValue: Any + std::fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn DynValue>;
    fn dyn_as_string(&self) -> Option<String>;
    fn type_name(&self) -> &'static str;
}

impl<T: BlackboardValue> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn DynValue> {
        Box::new(self.clone())
    }

    fn dyn_as_string(&self) -> Option<String> {
        self.as_string()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

#[derive(Debug)]
pub enum Value {
    /// Integer-based value
    Integer(i64),
    /// Float-based value
    Float(f64),
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Collection of `Value`s
    Vec(Vec<Value>),
    /// Custom types
    Dynamic(Box<dyn DynValue>),
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Integer(value) => Value::Integer(*value),
            Value::Float(value) => Value::Float(*value),
            Value::String(value) => Value::String(value.clone()),
            Value::Boolean(value) => Value::Boolean(*value),
            Value::Vec(vec) => Value::Vec(vec.clone()),
            Value::Dynamic(value) => Value::Dynamic(value.clone_boxed()),
        }
    }
}

impl Value {
    /// Returns the string representation of the value. This method will return `None`
    /// if it's a [`Value::Dynamic`] type whose [`BlackboardValue::as_string`] method
    /// returns `None`.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Integer(value) => Some(value.to_string()),
            Value::Float(value) => Some(value.to_string()),
            Value::String(value) => Some(value.clone()),
            Value::Boolean(value) => Some(value.to_string()),
            Value::Vec(vec) => {
                let items = vec
                    .iter()
                    .map(Value::as_string)
                    .collect::<Option<Vec<_>>>()?;

                Some(format!("[{}]", items.join(",")))
            }
            Value::Dynamic(value) => value.dyn_as_string(),
        }
    }

    /// Name of the stored kind, used in type mismatch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Vec(_) => "vec",
            Value::Dynamic(value) => value.type_name(),
        }
    }

    /// Whether `other` may overwrite `self` without changing the variable's type.
    pub fn same_kind(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Dynamic(a), Value::Dynamic(b)) => {
                a.as_any().type_id() == b.as_any().type_id()
            }
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    pub fn downcast_ref<T: BlackboardValue>(&self) -> Option<&T> {
        match self {
            Value::Dynamic(value) => value.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Typed extraction of a [`Value`].
pub trait FromValue: Sized {
    /// Kind name reported when extraction fails.
    fn expected_kind() -> &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_int {
    ($($int:ty)+) => {
        $(
            impl From<$int> for Value {
                fn from(value: $int) -> Value {
                    Value::Integer(value as i64)
                }
            }

            impl FromValue for $int {
                fn expected_kind() -> &'static str {
                    "integer"
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Integer(value) => <$int>::try_from(*value).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_int! { i8 u8 i16 u16 i32 u32 i64 u64 isize usize }

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Value {
        Value::Float(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl<T> From<T> for Value
where
    T: BlackboardValue,
{
    fn from(value: T) -> Self {
        Value::Dynamic(Box::new(value))
    }
}

impl FromValue for f64 {
    fn expected_kind() -> &'static str {
        "float"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn expected_kind() -> &'static str {
        "float"
    }

    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|value| value as f32)
    }
}

impl FromValue for bool {
    fn expected_kind() -> &'static str {
        "boolean"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn expected_kind() -> &'static str {
        "string"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn expected_kind() -> &'static str {
        "value"
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: BlackboardValue> FromValue for T {
    fn expected_kind() -> &'static str {
        std::any::type_name::<T>()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.downcast_ref::<T>().cloned()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Waypoint {
        x: i32,
        y: i32,
    }

    impl BlackboardValue for Waypoint {
        fn as_string(&self) -> Option<String> {
            Some(format!("{};{}", self.x, self.y))
        }
    }

    #[rstest]
    #[case::integer(Value::Integer(128), Some("128"))]
    #[case::float(Value::Float(1.23), Some("1.23"))]
    #[case::string(Value::String("hello".into()), Some("hello"))]
    #[case::boolean(Value::Boolean(true), Some("true"))]
    #[case::vec_ints(Value::Vec(vec![1.into(), 2.into(), 3.into()]), Some("[1,2,3]"))]
    #[case::dynamic(Waypoint { x: 4, y: -2 }.into(), Some("4;-2"))]
    fn as_string(#[case] value: Value, #[case] output: Option<&str>) {
        assert_eq!(value.as_string().as_deref(), output);
    }

    #[test]
    fn dynamic_values_clone_and_downcast() {
        let value: Value = Waypoint { x: 1, y: 2 }.into();
        let copy = value.clone();

        assert_eq!(Waypoint::from_value(&copy), Some(Waypoint { x: 1, y: 2 }));
        assert!(value.same_kind(&copy));
        assert!(!value.same_kind(&Value::Integer(1)));
    }

    #[test]
    fn integers_reject_out_of_range_targets() {
        assert_eq!(u8::from_value(&Value::Integer(300)), None);
        assert_eq!(i32::from_value(&Value::Integer(-7)), Some(-7));
        assert_eq!(bool::from_value(&Value::Integer(1)), None);
    }
}
