//! Core dialect operations and types.
//!
//! This dialect provides the fundamental building blocks:
//! - `core.module` - top-level module container
//! - `core.i{bits}` - integer type (e.g., `core.i32`, `core.i64`)
//! - `core.f{bits}` - floating-point type (e.g., `core.f32`, `core.f64`)
//! - `core.nil` - nil/unit type
//! - `core.string` - string type
//! - `core.memref(element) {shape}` - shaped memory reference
use std::collections::BTreeMap;
use std::ops::Deref;

use crate::constraint::SYMBOL_ATTR;
use crate::schema::{AttrSchema, OpSchema, SchemaRegistration};
use crate::{
    DialectType, IdVec, Location, Region, Symbol, Type, dialect, idvec, ir::BlockBuilder,
};

crate::symbols! {
    /// Key of the symbol-name attribute carried by symbol-defining operations.
    ATTR_SYM_NAME => "sym_name",
}

dialect! {
    mod core {
        // === Operations ===

        /// `core.module` operation: top-level module container.
        #[attr(sym_name: Symbol)]
        fn module() {
            #[region(body)] {}
        };

        // === Types ===

        /// `core.nil` type: unit type with a single inhabitant.
        type nil;

        /// `core.string` type: string type.
        type string;

        /// `core.memref` type: shaped memory reference over an element type.
        /// The shape is a list of integer extents.
        #[attr(shape: any)]
        type memref(element);
    }
}

impl<'db> Module<'db> {
    /// Create a new module with an explicit body region.
    pub fn create(
        db: &'db dyn salsa::Database,
        location: Location<'db>,
        name: Symbol,
        body: Region<'db>,
    ) -> Self {
        module(db, location, name, body)
    }

    /// Build a module with a closure that constructs the top-level block.
    pub fn build(
        db: &'db dyn salsa::Database,
        location: Location<'db>,
        name: Symbol,
        f: impl FnOnce(&mut BlockBuilder<'db>),
    ) -> Self {
        let mut top = BlockBuilder::new(db, location);
        f(&mut top);
        let region = Region::new(db, location, idvec![top.build()]);
        Self::create(db, location, name, region)
    }

    /// Get the module name.
    pub fn name(&self, db: &'db dyn salsa::Database) -> Symbol {
        self.sym_name(db)
    }
}

impl std::fmt::Debug for Module<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        salsa::with_attached_database(|db| {
            let name = self.name(db);
            let body = self.body(db);

            let mut count = 0;
            for block in body.blocks(db).iter() {
                count += block.operations(db).len();
            }

            f.debug_struct(&format!("Module({})", name))
                .field("operations", &count)
                .finish()
        })
        .unwrap_or_else(|| write!(f, "Module(<no database attached>)"))
    }
}

inventory::submit! {
    SchemaRegistration {
        schema: OpSchema {
            dialect: "core",
            name: "module",
            operands: &[],
            variadic: false,
            results: &[],
            attrs: &[AttrSchema {
                name: "sym_name",
                constraint: SYMBOL_ATTR,
                required: true,
            }],
            traits: &[],
        },
    }
}

// === Integer type wrapper ===

/// Integer type wrapper (`core.i{BITS}`).
///
/// Use `I::<32>::new(db)` or the type alias `I32::new(db)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct I<'db, const BITS: u16>(Type<'db>);

impl<'db, const BITS: u16> I<'db, BITS> {
    /// Create a new integer type with the specified bit width.
    pub fn new(db: &'db dyn salsa::Database) -> Self {
        Self(i(db, BITS))
    }
}

impl<'db, const BITS: u16> Deref for I<'db, BITS> {
    type Target = Type<'db>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'db, const BITS: u16> DialectType<'db> for I<'db, BITS> {
    fn as_type(&self) -> Type<'db> {
        self.0
    }

    fn from_type(db: &'db dyn salsa::Database, ty: Type<'db>) -> Option<Self> {
        if ty.dialect(db) == *_NAME && ty.name(db).with_str(|n| n == format!("i{BITS}").as_str()) {
            Some(Self(ty))
        } else {
            None
        }
    }
}

/// 1-bit integer type (boolean).
pub type I1<'db> = I<'db, 1>;
/// 8-bit integer type.
pub type I8<'db> = I<'db, 8>;
/// 16-bit integer type.
pub type I16<'db> = I<'db, 16>;
/// 32-bit integer type.
pub type I32<'db> = I<'db, 32>;
/// 64-bit integer type.
pub type I64<'db> = I<'db, 64>;

/// Create an integer type (`core.i{bits}`) with the given bit width.
pub fn i(db: &dyn salsa::Database, bits: u16) -> Type<'_> {
    Type::new(
        db,
        *_NAME,
        Symbol::from_dynamic(&format!("i{bits}")),
        IdVec::new(),
        BTreeMap::new(),
    )
}

// === Floating-point type wrapper ===

/// Floating-point type wrapper (`core.f{BITS}`).
///
/// Use `F::<32>::new(db)` or the type alias `F32::new(db)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct F<'db, const BITS: u16>(Type<'db>);

impl<'db, const BITS: u16> F<'db, BITS> {
    /// Create a new floating-point type with the specified bit width.
    pub fn new(db: &'db dyn salsa::Database) -> Self {
        Self(f(db, BITS))
    }
}

impl<'db, const BITS: u16> Deref for F<'db, BITS> {
    type Target = Type<'db>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'db, const BITS: u16> DialectType<'db> for F<'db, BITS> {
    fn as_type(&self) -> Type<'db> {
        self.0
    }

    fn from_type(db: &'db dyn salsa::Database, ty: Type<'db>) -> Option<Self> {
        if ty.dialect(db) == *_NAME && ty.name(db).with_str(|n| n == format!("f{BITS}").as_str()) {
            Some(Self(ty))
        } else {
            None
        }
    }
}

/// 32-bit floating-point type.
pub type F32<'db> = F<'db, 32>;
/// 64-bit floating-point type.
pub type F64<'db> = F<'db, 64>;

/// Create a floating-point type (`core.f{bits}`) with the given bit width.
pub fn f(db: &dyn salsa::Database, bits: u16) -> Type<'_> {
    Type::new(
        db,
        *_NAME,
        Symbol::from_dynamic(&format!("f{bits}")),
        IdVec::new(),
        BTreeMap::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, Attrs};

    fn attach<R>(f: impl FnOnce(&salsa::DatabaseImpl) -> R) -> R {
        salsa::Database::attach(&salsa::DatabaseImpl::default(), f)
    }

    #[test]
    fn integer_types_intern_by_width() {
        attach(|db| {
            assert_eq!(I32::new(db).as_type(), i(db, 32));
            assert_ne!(I32::new(db).as_type(), I64::new(db).as_type());
            assert_eq!(I32::new(db).name(db), "i32");
        });
    }

    #[test]
    fn from_type_checks_dialect_and_width() {
        attach(|db| {
            let ty = i(db, 32);
            assert!(I32::from_type(db, ty).is_some());
            assert!(I64::from_type(db, ty).is_none());
            assert!(F32::from_type(db, ty).is_none());

            let other = Type::new(
                db,
                Symbol::new("other"),
                Symbol::new("i32"),
                IdVec::new(),
                Attrs::new(),
            );
            assert!(I32::from_type(db, other).is_none());
        });
    }

    #[test]
    fn memref_carries_element_and_shape() {
        attach(|db| {
            let f32 = F32::new(db).as_type();
            let shape = Attribute::from(vec![2i64.into(), 3i64.into()]);
            let memref = Memref::new(db, f32, shape.clone());
            assert_eq!(memref.element(db), f32);
            assert_eq!(memref.shape(db), shape);
            assert_eq!(Memref::from_type(db, memref.as_type()), Some(memref));
            assert!(Memref::from_type(db, f32).is_none());
        });
    }

    #[test]
    fn nil_and_string_have_no_params() {
        attach(|db| {
            let nil = Nil::new(db);
            assert_eq!(nil.name(db), "nil");
            assert!(nil.params(db).is_empty());
            let string = String::new(db);
            assert_eq!(string.name(db), "string");
        });
    }
}
