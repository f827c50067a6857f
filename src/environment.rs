//! A stack of lexical frames: each `Frame` is a variable/mixin/function
//! map with a single optional parent, and an `Environment` is a cloneable
//! handle onto the current frame plus the global frame below the
//! intrinsic builtin frame. Frames are owned per `Compile` rather than
//! kept behind a process-wide global, so concurrent or repeated
//! compiles in the same process never share mutable variable state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::expression::{Expression, Parameter};
use crate::ast::statement::Block;

/// A mixin or function definition, captured together with the frame it
/// closes over: calling it evaluates its body in a new frame whose
/// parent is this captured closure, not whatever frame is active at
/// the call site, so free variables resolve lexically.
#[derive(Debug, Clone)]
pub struct Callable {
    pub params: Vec<Parameter>,
    pub body: Block,
    pub closure: Rc<RefCell<Frame>>,
}

#[derive(Debug, Default)]
pub struct Frame {
    vars: HashMap<String, Expression>,
    mixins: HashMap<String, Rc<Callable>>,
    functions: HashMap<String, Rc<Callable>>,
    parent: Option<Rc<RefCell<Frame>>>,
}

impl Frame {
    fn with_parent(parent: Option<Rc<RefCell<Frame>>>) -> Self {
        Frame {
            vars: HashMap::new(),
            mixins: HashMap::new(),
            functions: HashMap::new(),
            parent,
        }
    }
}

/// A chain of frames rooted at the intrinsic built-in frame. Cloning
/// an `Environment` clones the `Rc` pointer to the current frame only
/// (cheap, shares state) — used when capturing a mixin/function's
/// defining scope.
#[derive(Debug, Clone)]
pub struct Environment {
    current: Rc<RefCell<Frame>>,
    /// The frame directly below the intrinsic builtin frame: the one
    /// `set_global` must target ("Global frame
    /// identification").
    global: Rc<RefCell<Frame>>,
}

impl Environment {
    /// A fresh environment for one compile: an intrinsic (builtin)
    /// frame, with an empty global frame as its only child.
    pub fn new() -> Self {
        let intrinsic = Rc::new(RefCell::new(Frame::with_parent(None)));
        let global = Rc::new(RefCell::new(Frame::with_parent(Some(intrinsic))));
        Environment {
            current: Rc::clone(&global),
            global,
        }
    }

    pub fn global_frame(&self) -> Rc<RefCell<Frame>> {
        Rc::clone(&self.global)
    }

    pub fn current_frame(&self) -> Rc<RefCell<Frame>> {
        Rc::clone(&self.current)
    }

    /// Push a new child frame (entering `@if`/`@for`/`@each`/`@while`,
    /// a mixin, or a function body). Returns the child environment;
    /// the caller keeps its own (parent) `Environment` value to
    /// restore on exit.
    pub fn push_child(&self) -> Environment {
        Environment {
            current: Rc::new(RefCell::new(Frame::with_parent(Some(Rc::clone(&self.current))))),
            global: Rc::clone(&self.global),
        }
    }

    /// Enter a callable's body: a new frame whose parent is the
    /// callable's *captured* closure, not the caller's current frame
    /// ("lexical, not dynamic").
    pub fn enter_closure(&self, closure: &Rc<RefCell<Frame>>) -> Environment {
        Environment {
            current: Rc::new(RefCell::new(Frame::with_parent(Some(Rc::clone(closure))))),
            global: Rc::clone(&self.global),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.current.borrow().vars.contains_key(name)
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.global.borrow().vars.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Expression> {
        let mut frame = Some(Rc::clone(&self.current));
        while let Some(f) = frame {
            if let Some(v) = f.borrow().vars.get(name) {
                return Some(v.clone());
            }
            frame = f.borrow().parent.clone();
        }
        None
    }

    /// Write to the nearest frame that already binds `name`; if none
    /// binds it, write to the current frame.
    pub fn set_lexical(&self, name: &str, value: Expression) {
        let mut frame = Some(Rc::clone(&self.current));
        while let Some(f) = frame {
            if f.borrow().vars.contains_key(name) {
                f.borrow_mut().vars.insert(name.to_owned(), value);
                return;
            }
            frame = f.borrow().parent.clone();
        }
        self.current.borrow_mut().vars.insert(name.to_owned(), value);
    }

    pub fn set_local(&self, name: &str, value: Expression) {
        self.current.borrow_mut().vars.insert(name.to_owned(), value);
    }

    /// Write at the outermost (global) frame regardless of enclosing
    /// scope.
    pub fn set_global(&self, name: &str, value: Expression) {
        self.global.borrow_mut().vars.insert(name.to_owned(), value);
    }

    /// Restore a local binding to its pre-loop value on `@for`/`@each`
    /// exit: deletes the binding if it did not previously exist, or
    /// restores `previous` if it did, so a loop variable never leaks a
    /// stale value into code that runs after the loop.
    pub fn restore_local(&self, name: &str, previous: Option<Expression>) {
        match previous {
            Some(v) => {
                self.current.borrow_mut().vars.insert(name.to_owned(), v);
            }
            None => {
                self.current.borrow_mut().vars.remove(name);
            }
        }
    }

    pub fn insert_mixin(&self, name: &str, callable: Callable) {
        self.current
            .borrow_mut()
            .mixins
            .insert(name.to_owned(), Rc::new(callable));
    }

    pub fn insert_function(&self, name: &str, callable: Callable) {
        self.current
            .borrow_mut()
            .functions
            .insert(name.to_owned(), Rc::new(callable));
    }

    pub fn get_mixin(&self, name: &str) -> Option<Rc<Callable>> {
        let mut frame = Some(Rc::clone(&self.current));
        while let Some(f) = frame {
            if let Some(v) = f.borrow().mixins.get(name) {
                return Some(Rc::clone(v));
            }
            frame = f.borrow().parent.clone();
        }
        None
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<Callable>> {
        let mut frame = Some(Rc::clone(&self.current));
        while let Some(f) = frame {
            if let Some(v) = f.borrow().functions.get(name) {
                return Some(Rc::clone(v));
            }
            frame = f.borrow().parent.clone();
        }
        None
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
