//! The type pool: owning store, name index, and intern cache.
//!
//! The pool owns every resolved [`Type`] for one document build and hands
//! out [`TypeId`] indices. Three lookup paths exist:
//!
//! - builtin names (`u32`, `c_int`, `bool`, ...) resolve to singletons
//!   allocated once in [`TypePool::new`];
//! - declared names resolve through an insertion-ordered name index, so
//!   iteration and generated output stay deterministic;
//! - structural shapes resolve through the intern cache, which maps a
//!   `(kind, extra)` shape to its canonical id.
//!
//! Unique kinds never enter the cache; their identity is the allocation.

use apigen_util::IndexVec;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::types::{Type, TypeExtra, TypeId, TypeKind};

/// Builtin type names, matchable before any declared name.
const BUILTIN_NAMES: &[(&str, TypeKind)] = &[
    ("void", TypeKind::Void),
    ("anyopaque", TypeKind::Anyopaque),
    ("bool", TypeKind::Bool),
    ("c_uchar", TypeKind::Uchar),
    ("c_ichar", TypeKind::Ichar),
    ("c_char", TypeKind::Char),
    ("u8", TypeKind::U8),
    ("u16", TypeKind::U16),
    ("u32", TypeKind::U32),
    ("u64", TypeKind::U64),
    ("usize", TypeKind::Usize),
    ("c_ushort", TypeKind::CUshort),
    ("c_uint", TypeKind::CUint),
    ("c_ulong", TypeKind::CUlong),
    ("c_ulonglong", TypeKind::CUlonglong),
    ("i8", TypeKind::I8),
    ("i16", TypeKind::I16),
    ("i32", TypeKind::I32),
    ("i64", TypeKind::I64),
    ("isize", TypeKind::Isize),
    ("c_short", TypeKind::CShort),
    ("c_int", TypeKind::CInt),
    ("c_long", TypeKind::CLong),
    ("c_longlong", TypeKind::CLonglong),
    ("f32", TypeKind::F32),
    ("f64", TypeKind::F64),
];

/// The owning type store for one document build.
///
/// # Examples
///
/// ```
/// use apigen_sem::pool::TypePool;
/// use apigen_sem::types::TypeKind;
///
/// let pool = TypePool::new();
/// let id = pool.lookup("u32").unwrap();
/// assert_eq!(pool.get(id).kind, TypeKind::U32);
/// ```
pub struct TypePool {
    types: IndexVec<TypeId, Type>,
    named: IndexMap<String, TypeId>,
    cache: FxHashMap<(TypeKind, TypeExtra), TypeId>,
    builtins: Vec<(TypeKind, TypeId)>,
}

impl TypePool {
    /// Creates a pool with all builtin singletons allocated.
    pub fn new() -> Self {
        let mut pool = Self {
            types: IndexVec::with_capacity(BUILTIN_NAMES.len()),
            named: IndexMap::new(),
            cache: FxHashMap::default(),
            builtins: Vec::with_capacity(BUILTIN_NAMES.len()),
        };
        for &(_, kind) in BUILTIN_NAMES {
            let id = pool.types.push(Type {
                kind,
                name: None,
                is_anonymous: false,
                extra: TypeExtra::None,
            });
            pool.builtins.push((kind, id));
        }
        pool
    }

    /// The singleton id of a builtin kind.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a builtin kind.
    pub fn builtin(&self, kind: TypeKind) -> TypeId {
        self.builtins
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .unwrap_or_else(|| panic!("{kind:?} is not a builtin kind"))
    }

    /// Looks up a type by name: builtin names first, then declared names.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        if let Some(&(_, kind)) = BUILTIN_NAMES.iter().find(|(n, _)| *n == name) {
            return Some(self.builtin(kind));
        }
        self.named.get(name).copied()
    }

    /// Records `id` under `name_hint`, or under the type's own display
    /// name when no hint is given. Returns false if the name is taken.
    ///
    /// # Panics
    ///
    /// Panics when neither a hint nor a display name is available; a
    /// nameless registration is a caller bug.
    pub fn register(&mut self, id: TypeId, name_hint: Option<&str>) -> bool {
        let name = match name_hint {
            Some(hint) => hint.to_string(),
            None => self
                .get(id)
                .name
                .clone()
                .expect("registered type must have a name"),
        };
        if self.lookup(&name).is_some() {
            return false;
        }
        self.named.insert(name, id);
        true
    }

    /// Canonicalizes a composite shape.
    ///
    /// Structurally equal shapes return the same id: child ids are
    /// already canonical, so shape equality is plain payload equality,
    /// with sentinels compared as values and function parameters compared
    /// by name, documentation, and type.
    ///
    /// # Panics
    ///
    /// Panics for unique and builtin kinds; those never intern.
    pub fn intern(&mut self, kind: TypeKind, extra: TypeExtra) -> TypeId {
        assert!(
            !kind.is_unique() && !kind.is_builtin(),
            "{kind:?} cannot be interned"
        );

        let key = (kind, extra);
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }

        let (kind, extra) = (key.0, key.1.clone());
        let id = self.types.push(Type {
            kind,
            name: None,
            is_anonymous: false,
            extra,
        });
        self.cache.insert(key, id);
        id
    }

    /// Allocates a type without interning. Used for unique types (whose
    /// identity is the allocation) and for aliases.
    pub fn alloc(&mut self, ty: Type) -> TypeId {
        self.types.push(ty)
    }

    /// Shared access to a type.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    /// Mutable access to a type; phase 4 fills unique types through this.
    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id]
    }

    /// Follows alias links to the underlying type.
    pub fn unalias(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let TypeExtra::Alias(target) = self.types[current].extra {
            current = target;
        }
        current
    }

    /// Number of types in the pool, including builtins.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: the builtins are allocated on construction.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypePool")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayType, PointerType};
    use apigen_util::Value;

    fn pointer_to(pool: &mut TypePool, underlying: TypeId) -> TypeId {
        pool.intern(
            TypeKind::PtrToOne,
            TypeExtra::Pointer(PointerType {
                underlying,
                sentinel: Value::Null,
            }),
        )
    }

    #[test]
    fn test_builtin_lookup() {
        let pool = TypePool::new();
        for &(name, kind) in BUILTIN_NAMES {
            let id = pool.lookup(name).unwrap();
            assert_eq!(pool.get(id).kind, kind);
        }
        assert_eq!(pool.lookup("nonsense"), None);
    }

    #[test]
    fn test_builtins_are_singletons() {
        let pool = TypePool::new();
        assert_eq!(pool.lookup("u32"), pool.lookup("u32"));
        assert_ne!(pool.lookup("u32"), pool.lookup("u64"));
    }

    #[test]
    fn test_intern_is_idempotent() {
        let mut pool = TypePool::new();
        let u32_id = pool.lookup("u32").unwrap();
        let a = pointer_to(&mut pool, u32_id);
        let b = pointer_to(&mut pool, u32_id);
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_distinguishes_shapes() {
        let mut pool = TypePool::new();
        let u32_id = pool.lookup("u32").unwrap();
        let u64_id = pool.lookup("u64").unwrap();
        assert_ne!(
            pointer_to(&mut pool, u32_id),
            pointer_to(&mut pool, u64_id)
        );
    }

    #[test]
    fn test_intern_compares_sentinels() {
        let mut pool = TypePool::new();
        let u8_id = pool.lookup("u8").unwrap();
        let zero = pool.intern(
            TypeKind::ConstPtrToSentinelledMany,
            TypeExtra::Pointer(PointerType {
                underlying: u8_id,
                sentinel: Value::Uint(0),
            }),
        );
        let one = pool.intern(
            TypeKind::ConstPtrToSentinelledMany,
            TypeExtra::Pointer(PointerType {
                underlying: u8_id,
                sentinel: Value::Uint(1),
            }),
        );
        assert_ne!(zero, one);
    }

    #[test]
    fn test_intern_array_by_size_and_element() {
        let mut pool = TypePool::new();
        let u8_id = pool.lookup("u8").unwrap();
        let a = pool.intern(
            TypeKind::Array,
            TypeExtra::Array(ArrayType {
                size: 4,
                underlying: u8_id,
            }),
        );
        let b = pool.intern(
            TypeKind::Array,
            TypeExtra::Array(ArrayType {
                size: 4,
                underlying: u8_id,
            }),
        );
        let c = pool.intern(
            TypeKind::Array,
            TypeExtra::Array(ArrayType {
                size: 8,
                underlying: u8_id,
            }),
        );
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unique_types_never_share() {
        let mut pool = TypePool::new();
        let a = pool.alloc(Type {
            kind: TypeKind::Struct,
            name: Some("A".into()),
            is_anonymous: false,
            extra: TypeExtra::None,
        });
        let b = pool.alloc(Type {
            kind: TypeKind::Struct,
            name: Some("B".into()),
            is_anonymous: false,
            extra: TypeExtra::None,
        });
        assert_ne!(a, b);
    }

    #[test]
    #[should_panic(expected = "cannot be interned")]
    fn test_intern_rejects_unique_kinds() {
        let mut pool = TypePool::new();
        pool.intern(TypeKind::Struct, TypeExtra::None);
    }

    #[test]
    fn test_register_and_lookup() {
        let mut pool = TypePool::new();
        let id = pool.alloc(Type {
            kind: TypeKind::Opaque,
            name: Some("Handle".into()),
            is_anonymous: false,
            extra: TypeExtra::None,
        });
        assert!(pool.register(id, None));
        assert_eq!(pool.lookup("Handle"), Some(id));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut pool = TypePool::new();
        let a = pool.alloc(Type {
            kind: TypeKind::Opaque,
            name: Some("Handle".into()),
            is_anonymous: false,
            extra: TypeExtra::None,
        });
        let b = pool.alloc(Type {
            kind: TypeKind::Opaque,
            name: Some("Handle".into()),
            is_anonymous: false,
            extra: TypeExtra::None,
        });
        assert!(pool.register(a, None));
        assert!(!pool.register(b, None));
        assert_eq!(pool.lookup("Handle"), Some(a));
    }

    #[test]
    fn test_register_rejects_builtin_names() {
        let mut pool = TypePool::new();
        let id = pool.alloc(Type {
            kind: TypeKind::Opaque,
            name: Some("u32".into()),
            is_anonymous: false,
            extra: TypeExtra::None,
        });
        assert!(!pool.register(id, None));
    }

    #[test]
    fn test_register_with_hint() {
        let mut pool = TypePool::new();
        let u32_id = pool.lookup("u32").unwrap();
        let ptr = pointer_to(&mut pool, u32_id);
        assert!(pool.register(ptr, Some("WidgetPtr")));
        assert_eq!(pool.lookup("WidgetPtr"), Some(ptr));
    }

    #[test]
    fn test_unalias() {
        let mut pool = TypePool::new();
        let u8_id = pool.lookup("u8").unwrap();
        let alias = pool.alloc(Type {
            kind: TypeKind::Alias,
            name: Some("Byte".into()),
            is_anonymous: false,
            extra: TypeExtra::Alias(u8_id),
        });
        let alias2 = pool.alloc(Type {
            kind: TypeKind::Alias,
            name: Some("Octet".into()),
            is_anonymous: false,
            extra: TypeExtra::Alias(alias),
        });
        assert_eq!(pool.unalias(alias), u8_id);
        assert_eq!(pool.unalias(alias2), u8_id);
        assert_eq!(pool.unalias(u8_id), u8_id);
    }
}
