/// Commented default `settings.conf`, written the first time a value is persisted.
pub const SETTINGS_SKELETON_CONTENT: &str = "# Yum Extender settings\n\
#\n\
# Format: key = value\n\
# Lines starting with # are comments.\n\
#\n\
# ---------- Metadata refresh ----------\n\
# Hours between automatic repository metadata refreshes\n\
refresh_interval = 12\n\
# Last refresh markers (YYYY-MM-DD HH:MM), maintained automatically\n\
session_refresh = 2000-01-01 00:01\n\
system_refresh = 2000-01-01 00:01\n\
#\n\
# ---------- Transactions ----------\n\
# Packages that may never be removed (comma-separated)\n\
protected = yum,dnf,python3,dnf-yum\n\
# Upper bound on signing-key confirmations within a single transaction\n\
gpg_retry_limit = 8\n\
clean_instonly = false\n\
clean_unused = false\n\
#\n\
# ---------- Views ----------\n\
newest_only = true\n\
history_days = 180\n\
#\n\
# ---------- Session ----------\n\
autostart = false\n\
autocheck_updates = false\n\
hide_on_close = false\n";
