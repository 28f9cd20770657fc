use std::fmt::{self, Display};

/// 张量的二元运算符
#[derive(Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    AddAssign,
    Sub,
    Mul,
    Div,
    Stack,
    Compare,
}
impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation_name = match self {
            Operator::Add => "相加",
            Operator::AddAssign => "自相加",
            Operator::Sub => "相减",
            Operator::Mul => "相乘",
            Operator::Div => "相除",
            Operator::Stack => "堆叠",
            Operator::Compare => "比较",
        };
        write!(f, "{}", operation_name)
    }
}
