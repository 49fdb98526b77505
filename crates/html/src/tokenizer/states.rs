//! Tokenizer state machine definitions.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenizerState {
    Data,
    /// Content of `title`/`textarea`: text with character references.
    RcData,
    /// Content of `script`/`style`/`xmp`/`iframe`/`noembed`/`noframes`/
    /// `noscript`: text without character references.
    RawText,
    /// Everything after `<plaintext>` is text.
    PlainText,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    MarkupDeclarationOpen,
    Comment,
    BogusComment,
    Doctype,
}

impl TokenizerState {
    /// States in which a start or end tag is being assembled.
    pub(crate) fn is_tag(self) -> bool {
        matches!(
            self,
            TokenizerState::TagName
                | TokenizerState::BeforeAttributeName
                | TokenizerState::AttributeName
                | TokenizerState::AfterAttributeName
                | TokenizerState::BeforeAttributeValue
                | TokenizerState::AttributeValueDoubleQuoted
                | TokenizerState::AttributeValueSingleQuoted
                | TokenizerState::AttributeValueUnquoted
                | TokenizerState::AfterAttributeValueQuoted
                | TokenizerState::SelfClosingStartTag
        )
    }

    pub(crate) fn is_text(self) -> bool {
        matches!(
            self,
            TokenizerState::Data
                | TokenizerState::RcData
                | TokenizerState::RawText
                | TokenizerState::PlainText
        )
    }
}
