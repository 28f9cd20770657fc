/*
 * @Date         : 2026-02-03
 * @Description  : 本类仅包含一些属性与归约方法，不修改张量本身
 */

use super::Tensor;
use ndarray::ArrayD;

impl Tensor {
    pub fn view(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn view_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.data
    }

    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }

    /// 若为向量，`shape`可以是[n]；若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数，即`shape()`的元素个数
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 计算张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断张量是否为标量（所有维度均为1，或形状为`[]`）
    pub fn is_scalar(&self) -> bool {
        self.shape().iter().all(|x| *x == 1)
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 按行优先（标准布局）导出所有元素
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 所有元素的均值；空张量返回0
    pub fn mean(&self) -> f32 {
        if self.size() == 0 {
            return 0.0;
        }
        self.sum() / self.size() as f32
    }

    /// 所有元素的最大值；空张量返回None
    pub fn max(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }

    /// 是否所有元素都是有限值（非NaN、非无穷）
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}
