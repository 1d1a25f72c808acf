//! Handle plumbing shared by every heap object.
//!
//! Mutable objects ([`Paint`](crate::heap::Paint), [`Path`](crate::heap::Path), ...) are bound to
//! the assembler that created them for their whole life. Immutable objects (shaders, filters,
//! sampling options) are built from a factory and associate lazily with the first assembler that
//! uses them; the association sticks until it is reset explicitly.

use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::assembler::{
    Assembler, AssemblerRef, MemOpType, TypedMemOp, borrow_assembler,
};
use crate::ir::operand::MemOp;
use std::cell::{RefCell, RefMut};
use std::rc::Weak;

/// Reference counting on the emitted heap handle.
pub trait RefCounted {
    fn add_ref(&self) -> VgirResult<()>;
    /// Drops one reference; the last one emits `HeapFree`.
    fn unref(&self) -> VgirResult<()>;
}

/// Handle of a mutable heap object plus the assembler it was created by.
pub(crate) struct OwnedHandle {
    owner: AssemblerRef,
    op: TypedMemOp,
}

impl OwnedHandle {
    pub(crate) fn create(
        owner: &AssemblerRef,
        ty: MemOpType,
        factory: impl FnOnce(MemOp, &mut Assembler) -> VgirResult<()>,
    ) -> VgirResult<Self> {
        let op = borrow_assembler(owner)?.allocate_with_ref(ty, factory)?;
        Ok(Self {
            owner: owner.clone(),
            op,
        })
    }

    pub(crate) fn mem_op(&self) -> MemOp {
        self.op.op
    }

    /// Borrows the owning assembler for emitting an instruction on this object.
    pub(crate) fn asm(&self) -> VgirResult<RefMut<'_, Assembler>> {
        borrow_assembler(&self.owner)
    }

    /// Fails with `Ownership` unless `asm` created this object.
    pub(crate) fn check_owner(&self, asm: &Assembler) -> VgirResult<()> {
        asm.check_ownership(&self.owner, self.op.ty)
    }
}

impl RefCounted for OwnedHandle {
    fn add_ref(&self) -> VgirResult<()> {
        self.asm()?.add_ref(self.op)
    }

    fn unref(&self) -> VgirResult<()> {
        self.asm()?.unref(self.op)
    }
}

impl std::fmt::Debug for OwnedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.op.ty.name(), self.op.op)
    }
}

type Factory = Box<dyn Fn(MemOp, &mut Assembler) -> VgirResult<()>>;

enum Association {
    Unassociated,
    Associated {
        owner: Weak<RefCell<Assembler>>,
        op: MemOp,
    },
}

/// Immutable heap object that materializes into an assembler on first use.
pub(crate) struct StatelessObject {
    ty: MemOpType,
    factory: Factory,
    state: RefCell<Association>,
}

impl StatelessObject {
    pub(crate) fn new(
        ty: MemOpType,
        factory: impl Fn(MemOp, &mut Assembler) -> VgirResult<()> + 'static,
    ) -> Self {
        Self {
            ty,
            factory: Box::new(factory),
            state: RefCell::new(Association::Unassociated),
        }
    }

    /// Handle of this object in `asm`, creating it there on first use.
    pub(crate) fn associate(&self, asm: &mut Assembler) -> VgirResult<MemOp> {
        if let Association::Associated { owner, op } = &*self.state.borrow() {
            if asm.is(owner) {
                if asm.ref_count(*op) == 0 {
                    return Err(VgirError::assembler(format!(
                        "{} handle {op} was freed; reset its association before reuse",
                        self.ty.name()
                    )));
                }
                return Ok(*op);
            }
            return Err(VgirError::ownership(format!(
                "{} is associated with another assembler; reset its association first",
                self.ty.name()
            )));
        }
        let typed = asm.allocate_with_ref(self.ty, |op, asm| (self.factory)(op, asm))?;
        *self.state.borrow_mut() = Association::Associated {
            owner: asm.downgrade(),
            op: typed.op,
        };
        Ok(typed.op)
    }

    pub(crate) fn is_associated(&self) -> bool {
        matches!(&*self.state.borrow(), Association::Associated { .. })
    }

    pub(crate) fn reset_association(&self) {
        *self.state.borrow_mut() = Association::Unassociated;
    }

    pub(crate) fn mem_op(&self) -> VgirResult<MemOp> {
        match &*self.state.borrow() {
            Association::Associated { op, .. } => Ok(*op),
            Association::Unassociated => Err(VgirError::null_reference(self.ty.name())),
        }
    }

    fn with_owner(
        &self,
        f: impl FnOnce(&mut Assembler, TypedMemOp) -> VgirResult<()>,
    ) -> VgirResult<()> {
        let (owner, op) = match &*self.state.borrow() {
            Association::Associated { owner, op } => (owner.clone(), *op),
            Association::Unassociated => {
                return Err(VgirError::null_reference(self.ty.name()));
            }
        };
        let owner = owner.upgrade().ok_or_else(|| {
            VgirError::invalid_state(format!(
                "{} is associated with an assembler that no longer exists",
                self.ty.name()
            ))
        })?;
        let mut asm = borrow_assembler(&owner)?;
        f(&mut asm, TypedMemOp { op, ty: self.ty })
    }
}

impl RefCounted for StatelessObject {
    fn add_ref(&self) -> VgirResult<()> {
        self.with_owner(|asm, op| asm.add_ref(op))
    }

    fn unref(&self) -> VgirResult<()> {
        self.with_owner(|asm, op| asm.unref(op))
    }
}

/// Public newtype over a shared [`StatelessObject`].
macro_rules! stateless_object {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(std::rc::Rc<$crate::heap::object::StatelessObject>);

        impl $name {
            fn from_factory(
                factory: impl Fn(
                        $crate::ir::operand::MemOp,
                        &mut $crate::heap::assembler::Assembler,
                    ) -> $crate::foundation::error::VgirResult<()>
                    + 'static,
            ) -> Self {
                Self(std::rc::Rc::new($crate::heap::object::StatelessObject::new(
                    $crate::heap::assembler::MemOpType::$name,
                    factory,
                )))
            }

            pub(crate) fn associate(
                &self,
                asm: &mut $crate::heap::assembler::Assembler,
            ) -> $crate::foundation::error::VgirResult<$crate::ir::operand::MemOp> {
                self.0.associate(asm)
            }

            pub fn is_associated(&self) -> bool {
                self.0.is_associated()
            }

            /// Forgets the current association so the next use re-creates the object.
            pub fn reset_association(&self) {
                self.0.reset_association()
            }

            /// Handle in the associated assembler; `NullReference` while unassociated.
            pub fn mem_op(&self) -> $crate::foundation::error::VgirResult<$crate::ir::operand::MemOp> {
                self.0.mem_op()
            }
        }

        impl $crate::heap::object::RefCounted for $name {
            fn add_ref(&self) -> $crate::foundation::error::VgirResult<()> {
                self.0.add_ref()
            }

            fn unref(&self) -> $crate::foundation::error::VgirResult<()> {
                self.0.unref()
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("associated", &self.is_associated())
                    .finish()
            }
        }
    };
}

pub(crate) use stateless_object;

/// Associates an optional input, mapping `None` to the null handle.
pub(crate) fn associate_opt<T>(
    obj: Option<&T>,
    asm: &mut Assembler,
    f: impl FnOnce(&T, &mut Assembler) -> VgirResult<MemOp>,
) -> VgirResult<MemOp> {
    match obj {
        Some(o) => f(o, asm),
        None => Ok(MemOp::NULL),
    }
}
