//! RTL operator kinds, per the Expression Translator's operator-mapping table.
//!
//! Naming register follows `Operator` in the teacher's SystemVerilog tokenizer
//! (`core::lang::sv::token::operator`), trimmed to only the operators this engine's
//! expression translator maps onto SMT bit-vector operations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    // arithmetic
    Plus,
    Minus,
    Mult,
    Div,
    Modulus,
    // bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitNeg,
    // shifts
    ShiftL,
    ShiftR,
    ArithShiftR,
    // relational
    Lt,
    Lte,
    Gt,
    Gte,
    LogicEq,
    LogicIneq,
    // logical (converted to boolean via `x != 0` before combining)
    LogicAnd,
    LogicOr,
    LogicNeg,
}
