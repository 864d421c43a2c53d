//! View functions written in `rhai`.
//!
//! A source is invocable when evaluating it yields a function pointer, such
//! as the closure `|doc| emit(doc.title, 1)`, or when it defines exactly one
//! script function, such as `fn map(doc) { emit(doc.title, 1); }`.
//!
//! User code can call `emit(key, value)`, `emit(key)` and `log(message)`.
//! Throwing `#{ forbidden: reason }` or `#{ unauthorized: reason }` becomes
//! [`EvaluationError::Forbidden`] or [`EvaluationError::Unauthorized`].
//! `print` and `debug` go to the tracing sink. `eval` is disabled.

mod capture;

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;

use couchview_protocol::EmitRecord;
use lru::LruCache;
use rhai::{AST, Dynamic, Engine, EvalAltResult, FnPtr, FuncArgs, Map, Scope};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use self::capture::{Capture, SharedCapture};
use crate::engine::{Evaluated, Evaluator, SyntaxValidator};
use crate::error::{EvaluationError, SyntaxError};

const EVAL_TARGET: &str = "couchview_eval::rhai";
const USER_TARGET: &str = "couchview_eval::user";

const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Name prefix rhai gives the script functions backing closures.
const ANONYMOUS_PREFIX: &str = "anon$";

/// A compiled source and the function it resolves to.
struct Compiled {
    ast: AST,
    function: FnPtr,
}

/// View engine backed by the embedded `rhai` interpreter.
///
/// Compiled functions are cached by source text in a bounded LRU, so a map
/// function stored with `add_fun` is compiled once and reused for every
/// document.
pub struct RhaiEngine {
    engine: Engine,
    capture: SharedCapture,
    cache: RefCell<LruCache<String, Rc<Compiled>>>,
}

impl RhaiEngine {
    /// Creates an engine caching up to `cache_capacity` compiled functions.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let capture = SharedCapture::default();
        let mut engine = Engine::new();
        engine.disable_symbol("eval");
        capture::register(&mut engine, &capture);

        Self {
            engine,
            capture,
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    /// Returns the number of cached compiled functions.
    #[must_use]
    pub fn cached_functions(&self) -> usize {
        self.cache.borrow().len()
    }

    fn compiled(&self, source: &str) -> Result<Rc<Compiled>, EvaluationError> {
        let cached = self.cache.borrow_mut().get(source).cloned();
        if let Some(compiled) = cached {
            return Ok(compiled);
        }

        let compiled = Rc::new(self.compile_function(source)?);
        self.cache
            .borrow_mut()
            .put(source.to_owned(), Rc::clone(&compiled));
        debug!(
            target: EVAL_TARGET,
            cached = self.cached_functions(),
            "compiled view function"
        );
        Ok(compiled)
    }

    fn compile_function(&self, source: &str) -> Result<Compiled, EvaluationError> {
        let ast = self.engine.compile(source).map_err(syntax_error)?;
        let mut scope = Scope::new();
        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(classify)?;
        let function = resolve_function(&ast, result)?;
        Ok(Compiled { ast, function })
    }

    fn invoke(&self, compiled: &Compiled, args: impl FuncArgs) -> Result<Dynamic, EvaluationError> {
        compiled
            .function
            .call::<Dynamic>(&self.engine, &compiled.ast, args)
            .map_err(classify)
    }

    fn reset_capture(&self) {
        *self.capture.borrow_mut() = Capture::default();
    }

    fn take_capture(&self) -> Capture {
        self.capture.take()
    }
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl SyntaxValidator for RhaiEngine {
    fn validate(&self, source: &str) -> Result<(), SyntaxError> {
        self.engine.compile(source).map(drop).map_err(syntax_error)
    }
}

impl Evaluator for RhaiEngine {
    fn map_document(
        &self,
        source: &str,
        document: &Value,
    ) -> Result<Evaluated<Vec<EmitRecord>>, EvaluationError> {
        let compiled = self.compiled(source)?;
        self.reset_capture();
        let argument = to_dynamic(document, "document")?;
        self.invoke(&compiled, (argument,)).map(drop)?;

        let Capture { emitted, logs } = self.take_capture();
        Ok(Evaluated {
            value: emitted,
            logs,
        })
    }

    fn reduce(
        &self,
        source: &str,
        keys: &Value,
        values: &[Value],
        rereduce: bool,
    ) -> Result<Evaluated<Value>, EvaluationError> {
        let compiled = self.compiled(source)?;
        self.reset_capture();
        let arguments = (
            to_dynamic(keys, "keys")?,
            to_dynamic(values, "values")?,
            Dynamic::from_bool(rereduce),
        );
        let result = self.invoke(&compiled, arguments)?;
        let value = rhai::serde::from_dynamic::<Value>(&result).map_err(|error| {
            EvaluationError::Conversion {
                what: "reduce result",
                message: error.to_string(),
            }
        })?;

        Ok(Evaluated {
            value,
            logs: self.take_capture().logs,
        })
    }
}

fn syntax_error(error: rhai::ParseError) -> SyntaxError {
    SyntaxError::new(error.to_string())
}

fn to_dynamic<T: Serialize + ?Sized>(value: &T, what: &'static str) -> Result<Dynamic, EvaluationError> {
    rhai::serde::to_dynamic(value).map_err(|error| EvaluationError::Conversion {
        what,
        message: error.to_string(),
    })
}

fn resolve_function(ast: &AST, result: Dynamic) -> Result<FnPtr, EvaluationError> {
    let produced = result.type_name();
    if let Some(function) = result.try_cast::<FnPtr>() {
        return Ok(function);
    }

    let mut names = ast
        .iter_functions()
        .map(|metadata| metadata.name)
        .filter(|name| !name.starts_with(ANONYMOUS_PREFIX));
    match (names.next(), names.next()) {
        (Some(name), None) => {
            FnPtr::new(name).map_err(|error| EvaluationError::not_invocable(error.to_string()))
        }
        (None, _) => Err(EvaluationError::not_invocable(format!(
            "source evaluated to {produced}"
        ))),
        (Some(_), Some(_)) => Err(EvaluationError::not_invocable(
            "source defines more than one function",
        )),
    }
}

/// Maps an interpreter error onto the evaluation taxonomy.
///
/// Errors raised inside a called function are unwrapped so a `throw` from
/// user code is classified by its payload.
fn classify(error: Box<EvalAltResult>) -> EvaluationError {
    match *error {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => classify(inner),
        EvalAltResult::ErrorRuntime(ref payload, _) => control_event(payload)
            .unwrap_or_else(|| EvaluationError::runtime(error.to_string())),
        _ => EvaluationError::runtime(error.to_string()),
    }
}

fn control_event(payload: &Dynamic) -> Option<EvaluationError> {
    let map = payload.read_lock::<Map>()?;
    if let Some(reason) = map.get("forbidden") {
        return Some(EvaluationError::Forbidden {
            reason: capture::message_text(reason),
        });
    }
    map.get("unauthorized")
        .map(|reason| EvaluationError::Unauthorized {
            reason: capture::message_text(reason),
        })
}

#[cfg(test)]
mod tests;
