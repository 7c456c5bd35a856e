use utils::ByteSize;

crate::config_group!({

    /// The maximum number of files attached to a single message, counting both finished and
    /// in-flight uploads.  Unset means no limit.
    /// Can be overwritten by environment variable "CHAT_COMPOSER_UPLOAD_MAX_FILE_COUNT".
    ref max_file_count: Option<usize> = None;

    /// The maximum size of a single attached file, e.g. "10mb".  Unset means no limit.
    /// Can be overwritten by environment variable "CHAT_COMPOSER_UPLOAD_MAX_FILE_SIZE".
    ref max_file_size: Option<ByteSize> = None;

    /// File type filter handed to the file picker (e.g. "image/*,.pdf").  Not enforced on upload.
    ref accepted_file_types: Option<String> = None;

    /// How much data the local transport copies between progress reports.
    ref local_block_size: ByteSize = ByteSize::new(64 * 1024);

});
