/*
 * @Date         : 2026-02-03
 * @Description  : 张量的逐元素运算。二元运算要求两张量形状严格一致，否则panic
 */

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub};

use super::Tensor;
use crate::errors::{Operator, TensorError};

impl Tensor {
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.mapv(f),
        }
    }

    /// 与另一同形张量逐元素组合
    pub fn zip_map(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Self {
        self.assert_same_shape(other, Operator::Mul);
        let mut data = self.data.clone();
        data.zip_mut_with(&other.data, |a, &b| *a = f(*a, b));
        Self { data }
    }

    pub fn sqrt(&self) -> Self {
        self.map(f32::sqrt)
    }

    pub fn square(&self) -> Self {
        self.map(|x| x * x)
    }

    pub fn clamp(&self, min: f32, max: f32) -> Self {
        self.map(|x| x.clamp(min, max))
    }

    fn assert_same_shape(&self, other: &Self, operator: Operator) {
        assert!(
            self.shape() == other.shape(),
            "{}",
            TensorError::OperatorError {
                operator,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
    }
}

macro_rules! impl_tensor_binary_op {
    ($trait:ident, $method:ident, $op:tt, $operator:expr) => {
        impl $trait<&Tensor> for &Tensor {
            type Output = Tensor;
            fn $method(self, rhs: &Tensor) -> Tensor {
                self.assert_same_shape(rhs, $operator);
                Tensor {
                    data: &self.data $op &rhs.data,
                }
            }
        }
        impl $trait<Tensor> for Tensor {
            type Output = Tensor;
            fn $method(self, rhs: Tensor) -> Tensor {
                &self $op &rhs
            }
        }
        impl $trait<&Tensor> for Tensor {
            type Output = Tensor;
            fn $method(self, rhs: &Tensor) -> Tensor {
                &self $op rhs
            }
        }
        impl $trait<f32> for &Tensor {
            type Output = Tensor;
            fn $method(self, rhs: f32) -> Tensor {
                Tensor {
                    data: self.data.mapv(|x| x $op rhs),
                }
            }
        }
        impl $trait<f32> for Tensor {
            type Output = Tensor;
            fn $method(self, rhs: f32) -> Tensor {
                &self $op rhs
            }
        }
    };
}

impl_tensor_binary_op!(Add, add, +, Operator::Add);
impl_tensor_binary_op!(Sub, sub, -, Operator::Sub);
impl_tensor_binary_op!(Mul, mul, *, Operator::Mul);
impl_tensor_binary_op!(Div, div, /, Operator::Div);

impl Mul<&Tensor> for f32 {
    type Output = Tensor;
    fn mul(self, rhs: &Tensor) -> Tensor {
        rhs * self
    }
}

impl Neg for &Tensor {
    type Output = Tensor;
    fn neg(self) -> Tensor {
        self * -1.0
    }
}

impl AddAssign<&Tensor> for Tensor {
    fn add_assign(&mut self, rhs: &Tensor) {
        self.assert_same_shape(rhs, Operator::AddAssign);
        self.data += &rhs.data;
    }
}

impl AddAssign<f32> for Tensor {
    fn add_assign(&mut self, rhs: f32) {
        self.data.mapv_inplace(|x| x + rhs);
    }
}

impl MulAssign<f32> for Tensor {
    fn mul_assign(&mut self, rhs: f32) {
        self.data.mapv_inplace(|x| x * rhs);
    }
}
