//! Prompt construction for commit message generation.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Maximum length, in bytes, of the diff embedded in a prompt.
pub const MAX_DIFF_LENGTH: usize = 30_000;

const TRUNCATION_NOTE: &str = "（差分が長いため途中で省略されています。表示されている変更に基づいて生成してください。）";

/// Template used when the user has not configured one.
pub const DEFAULT_PROMPT: &str = r#"# 指示 git diffから、以下のルールで日本語のコミットメッセージを生成。
# ルール
- 役割: シニアエンジニア
- 件名: 【種類】概要 (50字以内を推奨。簡潔かつ内容が明確であれば、文字数に厳密にこだわる必要はない。)
- 空行: 件名と本文の間に必須
- 本文: 変更の背景や内容を記述。箇条書きの記号（・など）は不要。補足が必要な場合のみ簡潔に記述する。
- 種類: 【fix】, 【add】, 【update】, 【change】, 【clean】, 【disable】, 【remove】 から最も適切なものを選択し、**必ず角括弧と日本語の「種類」を組み合わせた形式で出力すること。**

# 重要な制約
- コミットメッセージのみを出力してください
- コードブロック記号（```、'''、`）は一切使用しないでください
- 「コミットメッセージ：」などの前置きも不要です
- マークダウン記号（#、**、*）も使用しないでください
- 説明文や補足説明は含めないでください

# 出力例
【fix】ユーザー認証時のエラーハンドリングを修正

nullチェック処理を追加
エラーメッセージの表示を改善"#;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("Invalid regex"));

/// Build the generation prompt: the user's template followed by the diff in
/// an input section.
///
/// The diff is stripped of terminal escapes and control characters and cut
/// at [`MAX_DIFF_LENGTH`] bytes, with a note telling the model it is partial.
pub fn build_prompt(template: &str, diff: &str) -> String {
    let (diff, truncated) = sanitize_diff(diff, MAX_DIFF_LENGTH);
    let note = if truncated {
        format!("\n{TRUNCATION_NOTE}")
    } else {
        String::new()
    };

    format!("{template}\n\n# 入力\n```\n{diff}\n```{note}")
}

/// Returns the cleaned diff and whether it had to be cut.
fn sanitize_diff(text: &str, max_len: usize) -> (String, bool) {
    let mut result = remove_control_chars(&ANSI_ESCAPE.replace_all(text, ""));

    if result.len() <= max_len {
        return (result, false);
    }

    let mut end = max_len;
    while end > 0 && !result.is_char_boundary(end) {
        end -= 1;
    }
    result.truncate(end);
    (result, true)
}

/// Drop control characters other than newline and tab.
fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}
