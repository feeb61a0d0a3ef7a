use crate::error::Result;
use crate::module::Module;
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Signature of functions provided by native modules
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// A function implemented in Rust and exposed as a module attribute
pub struct NativeFunction {
    qualname: String,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(qualname: impl Into<String>, func: NativeFn) -> Self {
        Self {
            qualname: qualname.into(),
            func,
        }
    }

    /// Qualified name, e.g. `os.path.dirname`
    pub fn qualname(&self) -> &str {
        &self.qualname
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.qualname)
    }
}

/// A value bound on a module or namespace.
///
/// Cloning is cheap and preserves identity: two clones are `ptr_eq`.
#[derive(Clone)]
pub enum Value {
    Module(Arc<Module>),
    Function(Arc<NativeFunction>),
    Data(Arc<serde_json::Value>),
    Object(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn data(value: impl Into<serde_json::Value>) -> Self {
        Self::Data(Arc::new(value.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::data(value.into())
    }

    pub fn function(qualname: impl Into<String>, func: NativeFn) -> Self {
        Self::Function(Arc::new(NativeFunction::new(qualname, func)))
    }

    /// Wrap an arbitrary host object
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Module(a), Self::Module(b)) => Arc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::Data(a), Self::Data(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => {
                std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
            }
            _ => false,
        }
    }

    pub fn as_module(&self) -> Option<&Arc<Module>> {
        match self {
            Self::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Arc<NativeFunction>> {
        match self {
            Self::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Module(_) => "module",
            Self::Function(_) => "function",
            Self::Data(_) => "data",
            Self::Object(_) => "object",
        }
    }

    /// JSON rendering used for reports
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Module(module) => json!({ "module": module.name() }),
            Self::Function(func) => json!({ "function": func.qualname() }),
            Self::Data(data) => data.as_ref().clone(),
            Self::Object(_) => json!({ "object": "opaque" }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(module) => write!(f, "<module {:?}>", module.name()),
            Self::Function(func) => func.fmt(f),
            Self::Data(data) => write!(f, "{data}"),
            Self::Object(_) => f.write_str("<object>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: &[Value]) -> Result<Value> {
        Ok(args.first().cloned().unwrap_or_else(|| Value::data(json!(null))))
    }

    #[test]
    fn clones_share_identity() {
        let value = Value::string("hello");
        let copy = value.clone();
        assert!(value.ptr_eq(&copy));
        assert!(!value.ptr_eq(&Value::string("hello")));
    }

    #[test]
    fn objects_compare_by_allocation() {
        let value = Value::object(42_u32);
        assert!(value.ptr_eq(&value.clone()));
        assert!(!value.ptr_eq(&Value::object(42_u32)));
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));
        assert_eq!(value.downcast_ref::<u64>(), None);
    }

    #[test]
    fn functions_call_through() {
        let value = Value::function("tests.echo", echo);
        let func = value.as_function().unwrap();
        assert_eq!(func.qualname(), "tests.echo");
        let out = func.call(&[Value::string("x")]).unwrap();
        assert_eq!(out.as_str(), Some("x"));
        assert_eq!(format!("{value:?}"), "<function tests.echo>");
    }

    #[test]
    fn renders_json() {
        assert_eq!(Value::data(json!([1, 2])).to_json(), json!([1, 2]));
        assert_eq!(
            Value::function("os.path.dirname", echo).to_json(),
            json!({ "function": "os.path.dirname" })
        );
        assert_eq!(
            Value::Module(Arc::new(Module::new("os"))).to_json(),
            json!({ "module": "os" })
        );
        assert_eq!(Value::object(()).type_name(), "object");
    }
}
