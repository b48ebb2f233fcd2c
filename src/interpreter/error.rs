use thiserror::Error;

/// Typed errors raised during evaluation.
///
/// Execution stops at the first error; the driver renders the message into
/// the output sink.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },
    #[error("Undefined variable for compound assignment: {name}")]
    UndefinedCompoundTarget { name: String },
    #[error("Built-in function '{name}' must be called with parentheses ()")]
    BareBuiltinReference { name: String },
    #[error("Attempted to call a non-function value (type: {type_name})")]
    NotCallable { type_name: &'static str },
    #[error("Wrong number of arguments for function. Expected {expected}, got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Operator '{op}' cannot be applied to types {left} and {right}")]
    InvalidBinaryOperands {
        op: String,
        left: &'static str,
        right: &'static str,
    },
    #[error("Operator '{op}' cannot be applied if an operand is Nil")]
    NilOperand { op: String },
    #[error("Operand for unary '-' must be a number. Got {type_name}")]
    InvalidNegationOperand { type_name: &'static str },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Modulo by zero")]
    ModuloByZero,
    #[error("Cannot multiply {type_name} by negative number")]
    NegativeRepeat { type_name: &'static str },
    #[error("Index must be a number. Got {type_name}")]
    IndexNotNumber { type_name: &'static str },
    #[error("Index must be an integer. Got {value}")]
    NonIntegerIndex { value: f64 },
    #[error("{type_name} index out of bounds: {index}, size: {len}")]
    IndexOutOfBounds {
        type_name: &'static str,
        index: i64,
        len: usize,
    },
    #[error("Cannot index non-list/non-string type: {type_name}")]
    NotIndexable { type_name: &'static str },
    #[error("Slice operation can only be applied to strings or lists. Got {type_name}")]
    NotSliceable { type_name: &'static str },
    #[error("Slice {bound} must be a number. Got {type_name}")]
    SliceBoundNotNumber {
        bound: &'static str,
        type_name: &'static str,
    },
    #[error("Slice step cannot be zero")]
    SliceStepZero,
    #[error("For loop can only iterate over lists or strings. Got: {type_name}")]
    InvalidIterable { type_name: &'static str },
    #[error("'break' outside of a loop")]
    BreakOutsideLoop,
    #[error("'continue' outside of a loop")]
    ContinueOutsideLoop,

    // Built-in operations
    #[error("{name}() expects {expected}")]
    BuiltinArity {
        name: &'static str,
        expected: &'static str,
    },
    #[error("{name}() {argument} must be {expected}. Got {got}")]
    BuiltinArgumentType {
        name: &'static str,
        argument: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    #[error("{name}() only supports lists stored in variables")]
    ListVariableRequired { name: &'static str },
    #[error("Variable '{variable}' is not a list or not found for {name}()")]
    ListVariableNotFound {
        name: &'static str,
        variable: String,
    },
    #[error("Cannot pop from an empty list")]
    PopFromEmptyList,
    #[error("List index for {name}() must be an integer. Got {value}")]
    NonIntegerListIndex { name: &'static str, value: f64 },
    #[error("Index out of bounds for {name}(): {index}, size: {len}")]
    ListIndexOutOfBounds {
        name: &'static str,
        index: i64,
        len: usize,
    },
    #[error("sort() can only sort lists of numbers or lists of strings. First element type: {type_name}")]
    UnsortableElementType { type_name: &'static str },
    #[error("Cannot sort list with mixed types (expected {expected})")]
    MixedSortTypes { expected: &'static str },
    #[error("range() step argument cannot be zero")]
    RangeStepZero,
    #[error("sqrt() argument cannot be negative")]
    SqrtOfNegative,
    #[error("join() expects a list of strings; found non-string element: {type_name}")]
    JoinNonStringElement { type_name: &'static str },
    #[error("replace() 'old_substring' cannot be empty")]
    ReplaceEmptyPattern,
    #[error("Failed to write to the output sink: {message}")]
    Output { message: String },
}

impl From<std::io::Error> for RuntimeError {
    fn from(error: std::io::Error) -> Self {
        RuntimeError::Output {
            message: error.to_string(),
        }
    }
}
