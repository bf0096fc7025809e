mod identifier_set;
mod item_pointer;
mod sparse_bitmap;
mod tuple_codec;
mod tuple_sort;
mod varint;
mod xid_set;

pub use identifier_set::CompactIdentifierSet;
pub use item_pointer::ItemPointer;
pub use sparse_bitmap::{BUCKET_BITS, BucketIter, SparseLongBitmap};
pub use tuple_codec::{
    BLOCKNO_BIAS, HEADER_LEN, LocationTuple, NULL_FLAG_PRESENT, SCORED_HEADER_LEN,
    SCORED_TUPLE_STRIDE, TUPLE_STRIDE, TupleBuffer, TupleIter, TupleWriter, decode_tuples,
    encode_tuples, header_len, tuple_stride,
};
pub use tuple_sort::{INSERTION_SORT_THRESHOLD, is_sorted_tuples, sort_tuples};
pub use varint::{MAX_VINT_LEN, push_vint, read_vint, write_vint};
pub use xid_set::{XID_SET_HEADER_LEN, decode_xid_set, encode_bitmap_xids, encode_xid_set};
