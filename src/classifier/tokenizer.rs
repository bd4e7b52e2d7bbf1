//! Text encoding for RoBERTa-family checkpoints.
//!
//! A checkpoint ships either a fast `tokenizer.json` or, like PhoBERT, only
//! the fastBPE pair `vocab.txt` + `bpe.codes`. The pair is rebuilt into a
//! `tokenizers` BPE model that splits words the same way fastBPE does.

use std::path::PathBuf;

use tokenizers::{
    decoders::DecoderWrapper,
    models::{
        bpe::{Merges, Vocab, BPE},
        ModelWrapper,
    },
    normalizers::NormalizerWrapper,
    pre_tokenizers::{whitespace::WhitespaceSplit, PreTokenizerWrapper},
    processors::{roberta::RobertaProcessing, PostProcessorWrapper},
    Tokenizer, TokenizerBuilder, TruncationParams,
};

use super::error::ModelError;

pub(crate) const FAST_TOKENIZER_FILE: &str = "tokenizer.json";
pub(crate) const BPE_VOCAB_FILE: &str = "vocab.txt";
pub(crate) const BPE_CODES_FILE: &str = "bpe.codes";

// fairseq dictionaries reserve the first four ids.
const BOS: (&str, u32) = ("<s>", 0);
const PAD: (&str, u32) = ("<pad>", 1);
const EOS: (&str, u32) = ("</s>", 2);
const UNK: (&str, u32) = ("<unk>", 3);
const MASK_TOKEN: &str = "<mask>";

/// Marks a piece that does not end its word in `vocab.txt`.
const CONTINUATION_MARK: &str = "@@";
/// Marks a piece that ends its word in `bpe.codes`.
const END_OF_WORD: &str = "</w>";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenizerSource {
    Fast(PathBuf),
    FastBpe { vocab: PathBuf, codes: PathBuf },
}

pub(crate) struct EncodedText {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Tokenizer plus the id range the model's embedding table accepts.
pub(crate) struct SentenceEncoder {
    tokenizer: Tokenizer,
    id_limit: usize,
    unk_id: Option<u32>,
}

impl SentenceEncoder {
    pub(crate) fn load(
        source: &TokenizerSource,
        max_length: usize,
        id_limit: usize,
    ) -> Result<Self, ModelError> {
        let tokenizer = match source {
            TokenizerSource::Fast(path) => Tokenizer::from_file(path).map_err(|e| {
                ModelError::Tokenization(format!(
                    "Failed to load tokenizer from '{}': {e}",
                    path.display()
                ))
            })?,
            TokenizerSource::FastBpe { vocab, codes } => {
                let vocab_txt = std::fs::read_to_string(vocab)?;
                let codes_txt = std::fs::read_to_string(codes)?;
                build_fastbpe_tokenizer(&vocab_txt, &codes_txt)?
            }
        };

        Self::new(tokenizer, max_length, id_limit)
    }

    fn new(mut tokenizer: Tokenizer, max_length: usize, id_limit: usize) -> Result<Self, ModelError> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ModelError::Tokenization(format!("Failed to configure truncation: {e}")))?;
        let unk_id = tokenizer.token_to_id(UNK.0);

        Ok(Self {
            tokenizer,
            id_limit,
            unk_id,
        })
    }

    pub(crate) fn encode(&self, text: &str) -> Result<EncodedText, ModelError> {
        let encoding = self.tokenizer.encode(text, true).map_err(|e| {
            ModelError::Tokenization(format!(
                "Tokenization failed on '{}': {}",
                &text.chars().take(50).collect::<String>(),
                e
            ))
        })?;

        // Intermediate merge pieces carry ids past the embedding table.
        let ids = encoding
            .get_ids()
            .iter()
            .map(|&id| match self.unk_id {
                _ if (id as usize) < self.id_limit => Ok(id),
                Some(unk) => Ok(unk),
                None => Err(ModelError::Tokenization(format!(
                    "token id {id} is outside the model vocabulary"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EncodedText {
            ids,
            attention_mask: encoding.get_attention_mask().to_vec(),
        })
    }
}

fn build_fastbpe_tokenizer(vocab_txt: &str, codes_txt: &str) -> Result<Tokenizer, ModelError> {
    let mut vocab = read_vocab(vocab_txt);
    let merges = read_merges(codes_txt, &mut vocab);

    let bpe = BPE::builder()
        .vocab_and_merges(vocab, merges)
        .unk_token(UNK.0.to_string())
        .end_of_word_suffix(END_OF_WORD.to_string())
        .build()
        .map_err(|e| ModelError::Tokenization(format!("Failed to build BPE model: {e}")))?;

    let post_processor = RobertaProcessing::new(
        (EOS.0.to_string(), EOS.1),
        (BOS.0.to_string(), BOS.1),
    );

    let tokenizer = TokenizerBuilder::<
        ModelWrapper,
        NormalizerWrapper,
        PreTokenizerWrapper,
        PostProcessorWrapper,
        DecoderWrapper,
    >::new()
    .with_model(bpe.into())
    .with_pre_tokenizer(Some(WhitespaceSplit.into()))
    .with_post_processor(Some(post_processor.into()))
    .build()
    .map_err(|e| ModelError::Tokenization(format!("Failed to assemble tokenizer: {e}")))?;

    Ok(Tokenizer::from(tokenizer))
}

/// fairseq dictionary layout: specials, one `token count` line per id, then
/// `<mask>`. Pieces are rekeyed to the `</w>` convention used by the merges.
fn read_vocab(vocab_txt: &str) -> Vocab {
    let mut vocab = Vocab::default();
    for (token, id) in [BOS, PAD, EOS, UNK] {
        vocab.insert(token.to_string(), id);
    }

    let mut next_id = UNK.1 + 1;
    for line in vocab_txt.lines() {
        let entry = line.trim_end();
        if entry.is_empty() {
            continue;
        }
        let word = entry.rsplit_once(' ').map_or(entry, |(word, _count)| word);
        let token = match word.strip_suffix(CONTINUATION_MARK) {
            Some(piece) => piece.to_string(),
            None => format!("{word}{END_OF_WORD}"),
        };
        if !vocab.contains_key(&token) {
            vocab.insert(token, next_id);
            next_id += 1;
        }
    }

    vocab.insert(MASK_TOKEN.to_string(), next_id);
    vocab
}

/// Every merge is kept, in file order. Pieces the dictionary lacks get ids
/// past the dictionary so the merge chain still runs.
fn read_merges(codes_txt: &str, vocab: &mut Vocab) -> Merges {
    let mut next_id = vocab.values().max().map_or(0, |id| id + 1);
    let mut merges = Merges::new();

    for line in codes_txt.lines() {
        if line.starts_with("#version") {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(left), Some(right)) = (parts.next(), parts.next()) else {
            continue;
        };

        for token in [left.to_string(), right.to_string(), format!("{left}{right}")] {
            if !vocab.contains_key(&token) {
                vocab.insert(token, next_id);
                next_id += 1;
            }
        }
        merges.push((left.to_string(), right.to_string()));
    }

    merges
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCAB: &str = "vui 120\nvẻ 80\nrất 200\nhôm@@ 15\nnay 90\n";
    const CODES: &str = "v u 500\nvu i</w> 400\nv ẻ</w> 300\nr ấ 250\nrấ t</w> 240\n";

    /// Specials, five dictionary lines, `<mask>`.
    const ID_LIMIT: usize = 10;

    fn encoder(max_length: usize) -> SentenceEncoder {
        let tokenizer = build_fastbpe_tokenizer(VOCAB, CODES).unwrap();
        SentenceEncoder::new(tokenizer, max_length, ID_LIMIT).unwrap()
    }

    #[test]
    fn dictionary_ids_follow_fairseq_layout() {
        let vocab = read_vocab(VOCAB);

        assert_eq!(vocab["<s>"], 0);
        assert_eq!(vocab["<pad>"], 1);
        assert_eq!(vocab["</s>"], 2);
        assert_eq!(vocab["<unk>"], 3);
        assert_eq!(vocab["vui</w>"], 4);
        assert_eq!(vocab["hôm"], 7);
        assert_eq!(vocab["nay</w>"], 8);
        assert_eq!(vocab["<mask>"], 9);
        assert!(!vocab.contains_key("hôm@@"));
    }

    #[test]
    fn merge_pieces_missing_from_dictionary_get_extra_ids() {
        let mut vocab = read_vocab(VOCAB);
        let merges = read_merges(CODES, &mut vocab);

        assert_eq!(merges.len(), 5);
        assert_eq!(merges[0], ("v".to_string(), "u".to_string()));
        assert!(vocab["vu"] as usize >= ID_LIMIT);
        assert!(vocab["i</w>"] as usize >= ID_LIMIT);
        assert_eq!(vocab["vui</w>"], 4);
    }

    #[test]
    fn whole_words_encode_to_dictionary_ids() {
        let encoded = encoder(256).encode("rất vui vẻ").unwrap();

        assert_eq!(encoded.ids, vec![0, 6, 4, 5, 2]);
        assert_eq!(encoded.attention_mask, vec![1; 5]);
    }

    #[test]
    fn pieces_outside_the_dictionary_become_unknown() {
        // "v" only exists as a merge intermediate, "u</w>" not at all.
        let encoded = encoder(256).encode("vu").unwrap();

        assert_eq!(encoded.ids, vec![0, 3, 3, 2]);
    }

    #[test]
    fn long_input_is_truncated_with_specials_kept() {
        let encoded = encoder(4).encode("vui vui vui vui vui").unwrap();

        assert_eq!(encoded.ids, vec![0, 4, 4, 2]);
    }
}
