//! Stack programs for fast evaluation of scalar symbolic expressions.
//!
//! Subexpressions shared by several parents are evaluated once and kept in slots at the bottom
//! of the stack, so the program size is proportional to the number of distinct nodes.
use crate::symbolic::{Comparison, Expr, ExprKind, MathFunction, Predicate, Symbol};
use rustc_hash::FxHashMap;

/// A single instruction of a [`Program`].
///
/// Booleans live on the same stack as numbers, encoded as `1.0` and `0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Constant(f64),
    Coordinate(usize),
    Time,
    /// Pops the given number of operands and pushes their sum.
    Add(usize),
    /// Pops the given number of operands and pushes their product.
    Mul(usize),
    Pow,
    Call(MathFunction),
    Compare(Comparison),
    And,
    Or,
    Not,
    /// Pops a boolean and jumps to the target if it is false.
    JumpIfFalse(usize),
    Jump(usize),
    /// Copies the top of the stack into a slot without popping it.
    Store(usize),
    /// Pushes the value of a slot.
    Load(usize),
}

/// A compiled scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    max_stack_size: usize,
    num_slots: usize,
}

struct Compiler {
    instructions: Vec<Instruction>,
    stack_size: usize,
    max_stack_size: usize,
    // Number of parents of each node, by node address
    uses: FxHashMap<usize, usize>,
    // Slots holding values computed on every path to the current instruction
    slots: FxHashMap<usize, usize>,
    num_slots: usize,
}

/// Counts the parents of every node, visiting shared nodes once.
fn count_uses(expr: &Expr, uses: &mut FxHashMap<usize, usize>) {
    let count = uses.entry(expr.node_address()).or_insert(0);
    *count += 1;
    if *count > 1 {
        return;
    }
    match expr.kind() {
        ExprKind::Number(_) | ExprKind::Symbol(_) => {}
        ExprKind::Sum(operands) | ExprKind::Product(operands) => operands.iter().for_each(|e| count_uses(e, uses)),
        ExprKind::Power(base, exponent) => {
            count_uses(base, uses);
            count_uses(exponent, uses);
        }
        ExprKind::Function(_, argument) => count_uses(argument, uses),
        ExprKind::Piecewise {
            predicate,
            then,
            otherwise,
        } => {
            count_predicate_uses(predicate, uses);
            count_uses(then, uses);
            count_uses(otherwise, uses);
        }
    }
}

fn count_predicate_uses(predicate: &Predicate, uses: &mut FxHashMap<usize, usize>) {
    match predicate {
        Predicate::Compare(_, a, b) => {
            count_uses(a, uses);
            count_uses(b, uses);
        }
        Predicate::And(p, q) | Predicate::Or(p, q) => {
            count_predicate_uses(p, uses);
            count_predicate_uses(q, uses);
        }
        Predicate::Not(p) => count_predicate_uses(p, uses),
    }
}

impl Compiler {
    fn emit(&mut self, instruction: Instruction, pops: usize, pushes: usize) -> usize {
        self.stack_size = self.stack_size - pops + pushes;
        self.max_stack_size = self.max_stack_size.max(self.stack_size);
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    fn patch_target(&mut self, jump: usize) {
        let target = self.instructions.len();
        match &mut self.instructions[jump] {
            Instruction::JumpIfFalse(t) | Instruction::Jump(t) => *t = target,
            _ => {}
        }
    }

    fn compile_expr(&mut self, expr: &Expr) {
        let is_leaf = matches!(expr.kind(), ExprKind::Number(_) | ExprKind::Symbol(_));
        let address = expr.node_address();
        let is_shared = !is_leaf && self.uses.get(&address).map_or(false, |&uses| uses > 1);
        if is_shared {
            if let Some(&slot) = self.slots.get(&address) {
                self.emit(Instruction::Load(slot), 0, 1);
                return;
            }
        }

        self.compile_node(expr);

        if is_shared {
            let slot = self.num_slots;
            self.num_slots += 1;
            self.emit(Instruction::Store(slot), 0, 0);
            self.slots.insert(address, slot);
        }
    }

    fn compile_node(&mut self, expr: &Expr) {
        match expr.kind() {
            ExprKind::Number(value) => {
                self.emit(Instruction::Constant(*value), 0, 1);
            }
            ExprKind::Symbol(Symbol::Coordinate(axis)) => {
                self.emit(Instruction::Coordinate(*axis), 0, 1);
            }
            ExprKind::Symbol(Symbol::Time) => {
                self.emit(Instruction::Time, 0, 1);
            }
            ExprKind::Sum(terms) => {
                terms.iter().for_each(|term| self.compile_expr(term));
                self.emit(Instruction::Add(terms.len()), terms.len(), 1);
            }
            ExprKind::Product(factors) => {
                factors.iter().for_each(|factor| self.compile_expr(factor));
                self.emit(Instruction::Mul(factors.len()), factors.len(), 1);
            }
            ExprKind::Power(base, exponent) => {
                self.compile_expr(base);
                self.compile_expr(exponent);
                self.emit(Instruction::Pow, 2, 1);
            }
            ExprKind::Function(function, argument) => {
                self.compile_expr(argument);
                self.emit(Instruction::Call(*function), 1, 1);
            }
            ExprKind::Piecewise {
                predicate,
                then,
                otherwise,
            } => {
                self.compile_predicate(predicate);
                let jump_to_otherwise = self.emit(Instruction::JumpIfFalse(0), 1, 0);
                // Values stored inside a branch are not available after it
                let outer_slots = self.slots.clone();
                self.compile_expr(then);
                let jump_to_end = self.emit(Instruction::Jump(0), 0, 0);
                // Only one of the branches leaves its value on the stack
                self.stack_size -= 1;
                self.patch_target(jump_to_otherwise);
                self.slots = outer_slots.clone();
                self.compile_expr(otherwise);
                self.patch_target(jump_to_end);
                self.slots = outer_slots;
            }
        }
    }

    fn compile_predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Compare(comparison, a, b) => {
                self.compile_expr(a);
                self.compile_expr(b);
                self.emit(Instruction::Compare(*comparison), 2, 1);
            }
            Predicate::And(p, q) => {
                self.compile_predicate(p);
                self.compile_predicate(q);
                self.emit(Instruction::And, 2, 1);
            }
            Predicate::Or(p, q) => {
                self.compile_predicate(p);
                self.compile_predicate(q);
                self.emit(Instruction::Or, 2, 1);
            }
            Predicate::Not(p) => {
                self.compile_predicate(p);
                self.emit(Instruction::Not, 1, 1);
            }
        }
    }
}

fn to_bool(value: f64) -> bool {
    value != 0.0
}

fn from_bool(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Program {
    pub fn compile(expr: &Expr) -> Self {
        let mut uses = FxHashMap::default();
        count_uses(expr, &mut uses);
        let mut compiler = Compiler {
            instructions: Vec::new(),
            stack_size: 0,
            max_stack_size: 0,
            uses,
            slots: FxHashMap::default(),
            num_slots: 0,
        };
        compiler.compile_expr(expr);
        Self {
            instructions: compiler.instructions,
            max_stack_size: compiler.max_stack_size,
            num_slots: compiler.num_slots,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The maximum number of values on the stack during execution, not counting slots.
    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// The number of slots holding shared subexpressions.
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Runs the program with the given coordinates and time.
    ///
    /// The stack is cleared before use, and its allocation is reused across calls.
    ///
    /// # Panics
    ///
    /// Panics if the program refers to a coordinate beyond the length of `coordinates`.
    pub fn execute(&self, coordinates: &[f64], time: f64, stack: &mut Vec<f64>) -> f64 {
        stack.clear();
        stack.reserve(self.num_slots + self.max_stack_size);
        stack.resize(self.num_slots, f64::NAN);
        let mut pc = 0;
        while let Some(instruction) = self.instructions.get(pc) {
            pc += 1;
            match *instruction {
                Instruction::Constant(value) => stack.push(value),
                Instruction::Coordinate(axis) => stack.push(coordinates[axis]),
                Instruction::Time => stack.push(time),
                Instruction::Add(n) => {
                    let sum: f64 = stack.drain(stack.len() - n..).sum();
                    stack.push(sum);
                }
                Instruction::Mul(n) => {
                    let product: f64 = stack.drain(stack.len() - n..).product();
                    stack.push(product);
                }
                Instruction::Pow => {
                    let exponent = pop(stack);
                    let base = pop(stack);
                    stack.push(base.powf(exponent));
                }
                Instruction::Call(function) => {
                    let argument = pop(stack);
                    stack.push(function.apply(argument));
                }
                Instruction::Compare(comparison) => {
                    let b = pop(stack);
                    let a = pop(stack);
                    stack.push(from_bool(comparison.apply(a, b)));
                }
                Instruction::And => {
                    let q = to_bool(pop(stack));
                    let p = to_bool(pop(stack));
                    stack.push(from_bool(p && q));
                }
                Instruction::Or => {
                    let q = to_bool(pop(stack));
                    let p = to_bool(pop(stack));
                    stack.push(from_bool(p || q));
                }
                Instruction::Not => {
                    let p = to_bool(pop(stack));
                    stack.push(from_bool(!p));
                }
                Instruction::JumpIfFalse(target) => {
                    if !to_bool(pop(stack)) {
                        pc = target;
                    }
                }
                Instruction::Jump(target) => pc = target,
                Instruction::Store(slot) => {
                    let top = stack.last().copied().unwrap_or(f64::NAN);
                    stack[slot] = top;
                }
                Instruction::Load(slot) => stack.push(stack[slot]),
            }
        }
        pop(stack)
    }
}

/// Pops the top of a stack produced by a well-formed program.
fn pop(stack: &mut Vec<f64>) -> f64 {
    stack.pop().unwrap_or(f64::NAN)
}
