pub mod tencent;
