//! # パイプとリダイレクトをサポートする小さなシェル
//!
//! 空白で区切られたトークン列をパースし、パイプでつながれた外部コマンドとして実行する。
//! 入力のリダイレクトは最初のコマンドに、出力のリダイレクトは最後のコマンドにのみ適用される。
//!
//! ## 利用例
//!
//! ```
//! use pipesh::{parser, token};
//! let tokens = token::split_words("sort <in.txt | uniq -c > out.txt");
//! let pipeline = parser::parse(&tokens).unwrap();
//! assert_eq!(pipeline.commands.len(), 2);
//! assert_eq!(pipeline.redirect_input, Some("in.txt"));
//! assert_eq!(pipeline.redirect_output, Some("out.txt"));
//! ```
pub mod builtin;
pub mod config;
pub mod helper;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod shell;
pub mod token;
