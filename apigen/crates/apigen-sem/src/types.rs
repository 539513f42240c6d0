//! Resolved type representation.
//!
//! A resolved [`Type`] lives in the pool and is referred to by its
//! [`TypeId`]; nothing in the pipeline holds references into the pool.
//! Identity semantics follow from the kind:
//!
//! - *Unique* kinds (enum, struct, union, opaque) are identified by their
//!   declaration site: every declaration allocates a fresh id, and two
//!   structurally identical unique types never compare equal.
//! - Primitive kinds are singletons allocated once when the pool is
//!   created.
//! - Everything else is canonicalized: structurally equal pointer, array,
//!   and function types share one id.

use apigen_util::{define_idx, Value};

define_idx!(TypeId);

/// Kinds of resolved types.
///
/// The twelve pointer variants are the cross-product of
/// `{one, many, sentinelled-many}` x `{mutable, const}` x
/// `{non-null, nullable}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Anyopaque,
    Bool,

    /// `unsigned char`
    Uchar,
    /// `signed char`
    Ichar,
    /// `char`
    Char,

    U8,
    U16,
    U32,
    U64,
    Usize,
    CUshort,
    CUint,
    CUlong,
    CUlonglong,

    I8,
    I16,
    I32,
    I64,
    Isize,
    CShort,
    CInt,
    CLong,
    CLonglong,

    F32,
    F64,

    PtrToOne,
    PtrToMany,
    PtrToSentinelledMany,
    NullablePtrToOne,
    NullablePtrToMany,
    NullablePtrToSentinelledMany,
    ConstPtrToOne,
    ConstPtrToMany,
    ConstPtrToSentinelledMany,
    NullableConstPtrToOne,
    NullableConstPtrToMany,
    NullableConstPtrToSentinelledMany,

    Enum,
    Struct,
    Union,
    Array,
    Opaque,
    Function,
    Alias,
}

impl TypeKind {
    /// Unique kinds are identified by declaration site, never by shape.
    pub fn is_unique(self) -> bool {
        matches!(
            self,
            TypeKind::Enum | TypeKind::Struct | TypeKind::Union | TypeKind::Opaque
        )
    }

    /// Builtin kinds are the statically allocated singletons.
    pub fn is_builtin(self) -> bool {
        matches!(
            self,
            TypeKind::Void
                | TypeKind::Anyopaque
                | TypeKind::Bool
                | TypeKind::Uchar
                | TypeKind::Ichar
                | TypeKind::Char
                | TypeKind::U8
                | TypeKind::U16
                | TypeKind::U32
                | TypeKind::U64
                | TypeKind::Usize
                | TypeKind::CUshort
                | TypeKind::CUint
                | TypeKind::CUlong
                | TypeKind::CUlonglong
                | TypeKind::I8
                | TypeKind::I16
                | TypeKind::I32
                | TypeKind::I64
                | TypeKind::Isize
                | TypeKind::CShort
                | TypeKind::CInt
                | TypeKind::CLong
                | TypeKind::CLonglong
                | TypeKind::F32
                | TypeKind::F64
        )
    }

    /// Integer kinds, including the character trio and the platform
    /// integer types. Excludes `bool` and the floats.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TypeKind::Uchar
                | TypeKind::Ichar
                | TypeKind::Char
                | TypeKind::U8
                | TypeKind::U16
                | TypeKind::U32
                | TypeKind::U64
                | TypeKind::Usize
                | TypeKind::CUshort
                | TypeKind::CUint
                | TypeKind::CUlong
                | TypeKind::CUlonglong
                | TypeKind::I8
                | TypeKind::I16
                | TypeKind::I32
                | TypeKind::I64
                | TypeKind::Isize
                | TypeKind::CShort
                | TypeKind::CInt
                | TypeKind::CLong
                | TypeKind::CLonglong
        )
    }

    /// Whether an integer kind is unsigned.
    ///
    /// `char` counts as unsigned: only `0..=127` is accepted for it, so
    /// the unsigned treatment is always in range.
    ///
    /// # Panics
    ///
    /// Panics for non-integer kinds.
    pub fn is_unsigned_integer(self) -> bool {
        match self {
            TypeKind::Uchar | TypeKind::Char => true,
            TypeKind::Ichar => false,
            TypeKind::U8 | TypeKind::U16 | TypeKind::U32 | TypeKind::U64 | TypeKind::Usize => true,
            TypeKind::CUshort | TypeKind::CUint | TypeKind::CUlong | TypeKind::CUlonglong => true,
            TypeKind::I8 | TypeKind::I16 | TypeKind::I32 | TypeKind::I64 | TypeKind::Isize => false,
            TypeKind::CShort | TypeKind::CInt | TypeKind::CLong | TypeKind::CLonglong => false,
            other => panic!("is_unsigned_integer on non-integer kind {other:?}"),
        }
    }

    /// Any of the twelve pointer kinds.
    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            TypeKind::PtrToOne
                | TypeKind::PtrToMany
                | TypeKind::PtrToSentinelledMany
                | TypeKind::NullablePtrToOne
                | TypeKind::NullablePtrToMany
                | TypeKind::NullablePtrToSentinelledMany
                | TypeKind::ConstPtrToOne
                | TypeKind::ConstPtrToMany
                | TypeKind::ConstPtrToSentinelledMany
                | TypeKind::NullableConstPtrToOne
                | TypeKind::NullableConstPtrToMany
                | TypeKind::NullableConstPtrToSentinelledMany
        )
    }

    /// Pointer kinds carrying a sentinel value.
    pub fn is_sentinelled_pointer(self) -> bool {
        matches!(
            self,
            TypeKind::PtrToSentinelledMany
                | TypeKind::NullablePtrToSentinelledMany
                | TypeKind::ConstPtrToSentinelledMany
                | TypeKind::NullableConstPtrToSentinelledMany
        )
    }

    /// Primitive kinds have no forward-declarable form in C; a use of one
    /// is always a hard dependency for declaration ordering.
    pub fn is_primitive(self) -> bool {
        self.is_builtin() || self.is_pointer() || self == TypeKind::Array
    }

    /// The canonical spelling of a kind, used in diagnostics.
    pub fn display_str(self) -> &'static str {
        match self {
            TypeKind::Void => "void",
            TypeKind::Anyopaque => "anyopaque",
            TypeKind::Bool => "bool",
            TypeKind::Uchar => "uchar",
            TypeKind::Ichar => "ichar",
            TypeKind::Char => "char",
            TypeKind::U8 => "u8",
            TypeKind::U16 => "u16",
            TypeKind::U32 => "u32",
            TypeKind::U64 => "u64",
            TypeKind::Usize => "usize",
            TypeKind::CUshort => "c_ushort",
            TypeKind::CUint => "c_uint",
            TypeKind::CUlong => "c_ulong",
            TypeKind::CUlonglong => "c_ulonglong",
            TypeKind::I8 => "i8",
            TypeKind::I16 => "i16",
            TypeKind::I32 => "i32",
            TypeKind::I64 => "i64",
            TypeKind::Isize => "isize",
            TypeKind::CShort => "c_short",
            TypeKind::CInt => "c_int",
            TypeKind::CLong => "c_long",
            TypeKind::CLonglong => "c_longlong",
            TypeKind::F32 => "f32",
            TypeKind::F64 => "f64",
            TypeKind::PtrToOne => "*T",
            TypeKind::PtrToMany => "[*]T",
            TypeKind::PtrToSentinelledMany => "[*:N]T",
            TypeKind::NullablePtrToOne => "?*T",
            TypeKind::NullablePtrToMany => "?[*]T",
            TypeKind::NullablePtrToSentinelledMany => "?[*:N]T",
            TypeKind::ConstPtrToOne => "*const T",
            TypeKind::ConstPtrToMany => "[*]const T",
            TypeKind::ConstPtrToSentinelledMany => "[*:N]const T",
            TypeKind::NullableConstPtrToOne => "?*const T",
            TypeKind::NullableConstPtrToMany => "?[*]const T",
            TypeKind::NullableConstPtrToSentinelledMany => "?[*:N]const T",
            TypeKind::Enum => "enum{}",
            TypeKind::Struct => "struct{}",
            TypeKind::Union => "union{}",
            TypeKind::Array => "[N]T",
            TypeKind::Opaque => "opaque",
            TypeKind::Function => "fn(...)T",
            TypeKind::Alias => "alias",
        }
    }
}

/// A resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    pub kind: TypeKind,
    /// Display name, set for declared and synthesized-anonymous types
    pub name: Option<String>,
    /// True for unique types minted for an inline occurrence
    pub is_anonymous: bool,
    pub extra: TypeExtra,
}

/// Kind-specific payload of a [`Type`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExtra {
    /// Builtins, opaque types, and unique types before phase 4 fills them
    None,
    Pointer(PointerType),
    Array(ArrayType),
    Enum(EnumType),
    /// Struct and union field lists
    Record(RecordType),
    Function(FunctionType),
    /// The aliased type
    Alias(TypeId),
}

/// Pointer payload; the sentinel is only meaningful for sentinelled kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PointerType {
    pub underlying: TypeId,
    pub sentinel: Value,
}

/// Array payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub size: u64,
    pub underlying: TypeId,
}

/// Enum payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub underlying: TypeId,
    pub items: Vec<EnumItem>,
}

/// One committed enum item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumItem {
    pub documentation: Option<String>,
    pub name: String,
    pub value: EnumValue,
}

/// The committed value of an enum item.
///
/// The signedness is a property of the whole enum at commit time, not of
/// the literal the user wrote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumValue {
    Signed(i64),
    Unsigned(u64),
}

impl EnumValue {
    /// The raw 64-bit payload. Duplicate detection compares bit patterns,
    /// because signed and unsigned values with identical bits collide in
    /// the emitted C enum.
    pub fn bit_pattern(self) -> u64 {
        match self {
            EnumValue::Signed(v) => v as u64,
            EnumValue::Unsigned(v) => v,
        }
    }
}

impl std::fmt::Display for EnumValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumValue::Signed(v) => write!(f, "{v}"),
            EnumValue::Unsigned(v) => write!(f, "{v}"),
        }
    }
}

/// Struct/union payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordType {
    pub fields: Vec<NamedValue>,
}

/// A named-and-typed slot: a field or a parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedValue {
    pub documentation: Option<String>,
    pub name: String,
    pub ty: TypeId,
}

/// Function payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub return_type: TypeId,
    pub parameters: Vec<NamedValue>,
}

/// An inclusive integer range with a signed lower and unsigned upper
/// bound, so that `i64` and `u64` extremes are both representable.
///
/// Platform-dependent types carry the invalid range `(0, 0)`; checks
/// against an invalid range are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueRange {
    pub min: i64,
    pub max: u64,
}

impl ValueRange {
    /// Accumulator start value: inserting any value shrinks it.
    pub const OBSERVED_INIT: ValueRange = ValueRange {
        min: i64::MAX,
        max: 0,
    };

    /// A range is valid when it can contain at least one value.
    pub fn is_valid(&self) -> bool {
        if self.min < 0 {
            return true;
        }
        self.max > self.min as u64
    }

    /// Whether a signed value lies inside the range.
    pub fn contains_signed(&self, value: i64) -> bool {
        value >= self.min && (value < 0 || value as u64 <= self.max)
    }

    /// Whether an unsigned value lies inside the range.
    pub fn contains_unsigned(&self, value: u64) -> bool {
        value <= self.max && (self.min < 0 || value >= self.min as u64)
    }

    /// Widen the range to include a signed value.
    pub fn insert_signed(&mut self, value: i64) {
        if self.min > value {
            self.min = value;
        }
        if value > 0 && self.max < value as u64 {
            self.max = value as u64;
        }
    }

    /// Widen the range to include an unsigned value.
    pub fn insert_unsigned(&mut self, value: u64) {
        if self.min > 0 && self.min as u64 > value {
            self.min = value as i64;
        }
        if self.max < value {
            self.max = value;
        }
    }
}

/// The value range of an integer kind.
///
/// Address-sized and C platform types return the invalid `(0, 0)` range;
/// their width is not known to the generator.
///
/// # Panics
///
/// Panics for non-integer kinds.
pub fn integer_range(kind: TypeKind) -> ValueRange {
    match kind {
        TypeKind::Uchar => ValueRange { min: 0, max: 0xFF },
        TypeKind::Ichar => ValueRange {
            min: -128,
            max: 0x7F,
        },
        TypeKind::Char => ValueRange { min: 0, max: 0x7F },

        TypeKind::U8 => ValueRange {
            min: 0,
            max: u8::MAX as u64,
        },
        TypeKind::U16 => ValueRange {
            min: 0,
            max: u16::MAX as u64,
        },
        TypeKind::U32 => ValueRange {
            min: 0,
            max: u32::MAX as u64,
        },
        TypeKind::U64 => ValueRange {
            min: 0,
            max: u64::MAX,
        },

        TypeKind::I8 => ValueRange {
            min: i8::MIN as i64,
            max: i8::MAX as u64,
        },
        TypeKind::I16 => ValueRange {
            min: i16::MIN as i64,
            max: i16::MAX as u64,
        },
        TypeKind::I32 => ValueRange {
            min: i32::MIN as i64,
            max: i32::MAX as u64,
        },
        TypeKind::I64 => ValueRange {
            min: i64::MIN,
            max: i64::MAX as u64,
        },

        // Architecture and compiler dependent types: width unknown.
        TypeKind::Usize
        | TypeKind::Isize
        | TypeKind::CUshort
        | TypeKind::CUint
        | TypeKind::CUlong
        | TypeKind::CUlonglong
        | TypeKind::CShort
        | TypeKind::CInt
        | TypeKind::CLong
        | TypeKind::CLonglong => ValueRange { min: 0, max: 0 },

        other => panic!("integer_range on non-integer kind {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_kinds() {
        assert!(TypeKind::Enum.is_unique());
        assert!(TypeKind::Struct.is_unique());
        assert!(TypeKind::Union.is_unique());
        assert!(TypeKind::Opaque.is_unique());
        assert!(!TypeKind::PtrToOne.is_unique());
        assert!(!TypeKind::U8.is_unique());
        assert!(!TypeKind::Alias.is_unique());
    }

    #[test]
    fn test_builtin_kinds() {
        assert!(TypeKind::Void.is_builtin());
        assert!(TypeKind::F64.is_builtin());
        assert!(!TypeKind::PtrToOne.is_builtin());
        assert!(!TypeKind::Struct.is_builtin());
    }

    #[test]
    fn test_integer_kinds() {
        assert!(TypeKind::Char.is_integer());
        assert!(TypeKind::CLonglong.is_integer());
        assert!(!TypeKind::Bool.is_integer());
        assert!(!TypeKind::F32.is_integer());
        assert!(!TypeKind::Void.is_integer());
    }

    #[test]
    fn test_primitive_kinds() {
        assert!(TypeKind::U8.is_primitive());
        assert!(TypeKind::NullableConstPtrToMany.is_primitive());
        assert!(TypeKind::Array.is_primitive());
        assert!(!TypeKind::Struct.is_primitive());
        assert!(!TypeKind::Function.is_primitive());
        assert!(!TypeKind::Alias.is_primitive());
    }

    #[test]
    fn test_sentinelled_pointers() {
        assert!(TypeKind::PtrToSentinelledMany.is_sentinelled_pointer());
        assert!(TypeKind::NullableConstPtrToSentinelledMany.is_sentinelled_pointer());
        assert!(!TypeKind::PtrToMany.is_sentinelled_pointer());
    }

    #[test]
    fn test_enum_value_bit_pattern() {
        assert_eq!(EnumValue::Signed(-1).bit_pattern(), u64::MAX);
        assert_eq!(EnumValue::Unsigned(u64::MAX).bit_pattern(), u64::MAX);
        assert_eq!(EnumValue::Signed(1).bit_pattern(), 1);
    }

    #[test]
    fn test_range_validity() {
        assert!(integer_range(TypeKind::U8).is_valid());
        assert!(integer_range(TypeKind::I64).is_valid());
        assert!(!integer_range(TypeKind::Usize).is_valid());
        assert!(!integer_range(TypeKind::CInt).is_valid());
    }

    #[test]
    fn test_range_containment() {
        let range = integer_range(TypeKind::I8);
        assert!(range.contains_signed(-128));
        assert!(range.contains_signed(127));
        assert!(!range.contains_signed(-129));
        assert!(!range.contains_signed(128));
        assert!(range.contains_unsigned(127));
        assert!(!range.contains_unsigned(128));

        let range = integer_range(TypeKind::U8);
        assert!(range.contains_unsigned(255));
        assert!(!range.contains_unsigned(256));
        assert!(!range.contains_signed(-1));
    }

    #[test]
    fn test_observed_range_accumulation() {
        let mut observed = ValueRange::OBSERVED_INIT;
        observed.insert_unsigned(5);
        assert_eq!(observed.min, 5);
        assert_eq!(observed.max, 5);
        observed.insert_signed(-3);
        assert_eq!(observed.min, -3);
        assert_eq!(observed.max, 5);
        observed.insert_unsigned(300);
        assert_eq!(observed.max, 300);
    }

    #[test]
    fn test_char_range() {
        let range = integer_range(TypeKind::Char);
        assert!(range.contains_unsigned(127));
        assert!(!range.contains_unsigned(128));
        assert!(TypeKind::Char.is_unsigned_integer());
    }
}
