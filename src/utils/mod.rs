//! # 常用工具模块
//!
//! 本模块提供单元测试用的断言宏
