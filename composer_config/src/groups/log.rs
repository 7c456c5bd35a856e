crate::config_group!({

    /// The log destination.  Unset or empty logs to the console.
    ///
    /// If this path exists as a directory or ends with a /, one log file per process is created in
    /// that directory; otherwise logs are written to this file.
    ref dest: Option<String> = None;

    /// The format the logs are printed in. If "json", logs are written as json blobs; otherwise
    /// they are text.  By default file logging uses json and console logging uses text.
    ref format: Option<String> = None;

    /// The base name of a log file when logging to a directory.
    ref prefix: String = "composer".to_owned();

});
