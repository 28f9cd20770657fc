/*
 * @Date         : 2026-02-06
 * @Description  : Layer 模块 - 组合运算节点与参数，构建常见网络结构
 *
 * Layer 持有自己的参数 Var（以及不可训练的缓冲区），`forward()` 直接接收 Var，
 * 由于 Var 携带图引用，不需要额外传入 &Graph。
 */

mod batch_norm;
mod conv2d;
mod prelu;

pub use batch_norm::BatchNorm2d;
pub use conv2d::Conv2d;
pub use prelu::PRelu;
