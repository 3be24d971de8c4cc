//! The tree-walking evaluator.
//!
//! Statements have effects; expressions produce values. Non-local control
//! flow (`break`, `return`, runtime errors) rides the `Err` channel as an
//! [`Interrupt`], unwinding through any intervening blocks; each
//! [`execute_block`](Interpreter::execute_block) restores the frame it
//! entered with on every exit path, so the current-frame invariant holds no
//! matter where the unwind started.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    diagnostics::RuntimeError,
    environment::Environment,
    expressions::{BinaryOp, Expr, ExprLoc, LogicalOp, Stmt, UnaryOp, VarUse},
    intern::Interner,
    io::PrintWriter,
    resolve::Resolutions,
    tracer::Tracer,
    value::{Function, StrValue, Value},
};

/// Calls nested deeper than this fail with `Stack overflow.` instead of
/// exhausting the host stack. Each interpreted call costs several host
/// frames, so the cap is well under what the host could nominally take.
const MAX_CALL_DEPTH: usize = 256;

/// A non-local exit in flight.
///
/// `Break` and `Return` are control flow, not errors: the nearest enclosing
/// loop or call catches them. Only `Error` surfaces to the driver.
pub(crate) enum Interrupt {
    Break,
    Return(Value),
    Error(RuntimeError),
}

type Flow<T> = Result<T, Interrupt>;

/// Evaluates a resolved program against an environment chain.
pub(crate) struct Interpreter<'a, W: PrintWriter, T: Tracer> {
    interner: &'a Interner,
    resolutions: &'a Resolutions,
    /// The root frame; unresolved names fall through to dynamic lookup here.
    globals: Environment,
    /// The innermost frame at the current execution point.
    environment: Environment,
    print: &'a mut W,
    tracer: &'a mut T,
    call_depth: usize,
}

impl<'a, W: PrintWriter, T: Tracer> Interpreter<'a, W, T> {
    pub fn new(
        interner: &'a Interner,
        resolutions: &'a Resolutions,
        globals: Environment,
        print: &'a mut W,
        tracer: &'a mut T,
    ) -> Self {
        let environment = globals.clone();
        Self {
            interner,
            resolutions,
            globals,
            environment,
            print,
            tracer,
            call_depth: 0,
        }
    }

    /// Runs a sequence of top-level statements.
    ///
    /// With `echo_expressions` set (REPL mode), bare expression statements
    /// print their value. A top-level `return` ends the program normally; a
    /// `Break` cannot surface here because the parser rejects `break`
    /// outside loops.
    pub fn interpret(&mut self, stmts: &[Stmt], echo_expressions: bool) -> Result<(), RuntimeError> {
        for stmt in stmts {
            let flow = if echo_expressions && let Stmt::Expression(expr) = stmt {
                self.echo(expr)
            } else {
                self.execute(stmt)
            };
            if let Err(interrupt) = flow {
                return match interrupt {
                    Interrupt::Error(error) => Err(error),
                    Interrupt::Return(_) | Interrupt::Break => Ok(()),
                };
            }
        }
        Ok(())
    }

    fn echo(&mut self, expr: &ExprLoc) -> Flow<()> {
        let value = self.evaluate(expr)?;
        let rendered = value.render(self.interner);
        self.print.write_str(&rendered);
        self.print.write_char('\n');
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Flow<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                let rendered = value.render(self.interner);
                self.print.write_str(&rendered);
                self.print.write_char('\n');
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.id, value);
                Ok(())
            }
            Stmt::Block(stmts) => self.execute_block(stmts, self.environment.child()),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body) {
                        Err(Interrupt::Break) => break,
                        other => other?,
                    }
                }
                Ok(())
            }
            Stmt::Break { .. } => Err(Interrupt::Break),
            Stmt::Function(decl) => {
                let function = Value::Fn(Rc::new(Function {
                    decl: Rc::clone(decl),
                    closure: self.environment.clone(),
                }));
                let name = decl.name.expect("function statement carries a name");
                self.environment.define(name.id, function);
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Interrupt::Return(value))
            }
        }
    }

    /// Runs `stmts` with `frame` as the current frame, restoring the prior
    /// frame on every exit path (fall-through, break, return, error).
    fn execute_block(&mut self, stmts: &[Stmt], frame: Environment) -> Flow<()> {
        let previous = std::mem::replace(&mut self.environment, frame);
        let mut result = Ok(());
        for stmt in stmts {
            result = self.execute(stmt);
            if result.is_err() {
                break;
            }
        }
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &ExprLoc) -> Flow<Value> {
        let line = expr.line;
        match &expr.expr {
            Expr::Literal(literal) => Ok(Value::from(*literal)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Num(n) => Ok(Value::Num(-n)),
                        _ => Err(self.error(line, "Operand must be a number.")),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Binary { left, op, right } => self.binary(line, left, *op, right),
            Expr::Logical { left, op, right } => {
                let left_value = self.evaluate(left)?;
                let decided = match op {
                    LogicalOp::Or => left_value.is_truthy(),
                    LogicalOp::And => !left_value.is_truthy(),
                };
                // the result is the operand itself, not a boolean
                if decided { Ok(left_value) } else { self.evaluate(right) }
            }
            Expr::Ternary {
                cond,
                if_true,
                if_false,
            } => {
                if self.evaluate(cond)?.is_truthy() {
                    self.evaluate(if_true)
                } else {
                    self.evaluate(if_false)
                }
            }
            Expr::Variable(var_use) => self.lookup_variable(var_use),
            Expr::Assign { target, value } => {
                let value = self.evaluate(value)?;
                let assigned = match self.resolutions.depth(target.use_id) {
                    Some(depth) => self.environment.assign_at(depth, target.name, value.clone()),
                    None => self.globals.assign(target.name, value.clone()),
                };
                if assigned {
                    Ok(value)
                } else {
                    Err(self.undefined_variable(target))
                }
            }
            Expr::Call { callee, args } => {
                let callee_value = self.evaluate(callee)?;
                let mut arg_values: SmallVec<[Value; 8]> = SmallVec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate(arg)?);
                }
                self.call_value(callee_value, &arg_values, line)
            }
            Expr::Lambda(decl) => Ok(Value::Fn(Rc::new(Function {
                decl: Rc::clone(decl),
                closure: self.environment.clone(),
            }))),
        }
    }

    fn binary(&mut self, line: u32, left: &ExprLoc, op: BinaryOp, right: &ExprLoc) -> Flow<Value> {
        let lhs = self.evaluate(left)?;
        let rhs = self.evaluate(right)?;
        match op {
            BinaryOp::Add => match (&lhs, &rhs) {
                (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
                (Value::Str(a), Value::Str(b)) => {
                    let joined = format!("{}{}", a.as_str(self.interner), b.as_str(self.interner));
                    Ok(Value::Str(StrValue::Runtime(joined.into())))
                }
                _ => Err(self.error(line, "Operands must be two numbers or two strings.")),
            },
            BinaryOp::Sub => {
                let (a, b) = self.num_operands(line, &lhs, &rhs)?;
                Ok(Value::Num(a - b))
            }
            BinaryOp::Mul => {
                let (a, b) = self.num_operands(line, &lhs, &rhs)?;
                Ok(Value::Num(a * b))
            }
            BinaryOp::Div => {
                // IEEE division: dividing by zero yields an infinity or nan
                let (a, b) = self.num_operands(line, &lhs, &rhs)?;
                Ok(Value::Num(a / b))
            }
            BinaryOp::Lt => {
                let (a, b) = self.num_operands(line, &lhs, &rhs)?;
                Ok(Value::Bool(a < b))
            }
            BinaryOp::LtE => {
                let (a, b) = self.num_operands(line, &lhs, &rhs)?;
                Ok(Value::Bool(a <= b))
            }
            BinaryOp::Gt => {
                let (a, b) = self.num_operands(line, &lhs, &rhs)?;
                Ok(Value::Bool(a > b))
            }
            BinaryOp::GtE => {
                let (a, b) = self.num_operands(line, &lhs, &rhs)?;
                Ok(Value::Bool(a >= b))
            }
            BinaryOp::Eq => Ok(Value::Bool(lhs.equals(&rhs, self.interner))),
            BinaryOp::NotEq => Ok(Value::Bool(!lhs.equals(&rhs, self.interner))),
        }
    }

    fn lookup_variable(&mut self, var_use: &VarUse) -> Flow<Value> {
        let found = match self.resolutions.depth(var_use.use_id) {
            Some(depth) => self.environment.get_at(depth, var_use.name),
            None => self.globals.get(var_use.name),
        };
        found.ok_or_else(|| self.undefined_variable(var_use))
    }

    fn call_value(&mut self, callee: Value, args: &[Value], line: u32) -> Flow<Value> {
        match callee {
            Value::Fn(function) => self.call_function(&function, args, line),
            Value::Builtin(builtin) => {
                if args.len() != builtin.arity() {
                    return Err(self.arity_error(line, builtin.arity(), args.len()));
                }
                Ok(builtin.call(args))
            }
            _ => Err(self.error(line, "Can only call functions.")),
        }
    }

    fn call_function(&mut self, function: &Function, args: &[Value], line: u32) -> Flow<Value> {
        if args.len() != function.arity() {
            return Err(self.arity_error(line, function.arity(), args.len()));
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(self.error(line, "Stack overflow."));
        }
        self.call_depth += 1;
        let name = match function.name_id() {
            Some(id) => self.interner.get(id),
            None => "",
        };
        self.tracer.on_call(name, self.call_depth);

        // the new frame chains to the closure's captured frame, not the
        // caller's: closures are lexical
        let frame = function.closure.child();
        for (param, value) in function.decl.params.iter().zip(args) {
            frame.define(param.id, value.clone());
        }
        let result = self.execute_block(&function.decl.body, frame);

        self.tracer.on_return(self.call_depth);
        self.call_depth -= 1;
        match result {
            Ok(()) => Ok(Value::Nil),
            Err(Interrupt::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }

    fn num_operands(&self, line: u32, lhs: &Value, rhs: &Value) -> Flow<(f64, f64)> {
        match (lhs, rhs) {
            (Value::Num(a), Value::Num(b)) => Ok((*a, *b)),
            _ => Err(self.error(line, "Operands must be numbers.")),
        }
    }

    fn error(&self, line: u32, message: &str) -> Interrupt {
        Interrupt::Error(RuntimeError::new(line, message))
    }

    fn arity_error(&self, line: u32, expected: usize, got: usize) -> Interrupt {
        Interrupt::Error(RuntimeError::new(
            line,
            format!("Expected {expected} arguments but got {got}."),
        ))
    }

    fn undefined_variable(&self, var_use: &VarUse) -> Interrupt {
        Interrupt::Error(RuntimeError::new(
            var_use.line,
            format!("Undefined variable '{}'.", self.interner.get(var_use.name)),
        ))
    }
}
