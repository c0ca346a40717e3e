//! SQL DDL for the operations database (SQLite dialect).
//! Timestamps are RFC3339 TEXT; enum-like columns hold their display labels.

pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS lead_lists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    business_name TEXT NOT NULL,
    contact_name TEXT NULL,
    phone TEXT NULL,
    email TEXT NULL,
    city TEXT NULL,
    country TEXT NULL,
    industry TEXT NULL,
    status TEXT NOT NULL DEFAULT 'New',
    source TEXT NOT NULL DEFAULT 'Other',
    priority TEXT NULL,
    list_id INTEGER NULL REFERENCES lead_lists(id) ON DELETE SET NULL,
    notes TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);
CREATE INDEX IF NOT EXISTS idx_leads_list_id ON leads(list_id);

CREATE TABLE IF NOT EXISTS call_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lead_id INTEGER NULL REFERENCES leads(id) ON DELETE SET NULL,
    business_name TEXT NULL,
    phone TEXT NOT NULL,
    caller TEXT NULL,
    outcome TEXT NOT NULL,
    duration_seconds INTEGER NOT NULL DEFAULT 0,
    notes TEXT NULL,
    source TEXT NOT NULL DEFAULT 'manual',
    called_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_call_logs_called_at ON call_logs(called_at);

CREATE TABLE IF NOT EXISTS email_sends (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lead_id INTEGER NULL,
    recipient TEXT NOT NULL,
    subject TEXT NOT NULL,
    body TEXT NOT NULL,
    status TEXT NOT NULL,
    error TEXT NULL,
    created_at TEXT NOT NULL,
    sent_at TEXT NULL
);

CREATE TABLE IF NOT EXISTS email_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    send_id INTEGER NULL REFERENCES email_sends(id) ON DELETE SET NULL,
    lead_id INTEGER NULL,
    recipient TEXT NOT NULL,
    subject TEXT NOT NULL,
    status TEXT NOT NULL,
    error TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_email_logs_created_at ON email_logs(created_at);

CREATE TABLE IF NOT EXISTS email_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    smtp_host TEXT NOT NULL,
    smtp_port INTEGER NOT NULL,
    smtp_username TEXT NOT NULL,
    from_name TEXT NOT NULL,
    from_address TEXT NOT NULL,
    imap_host TEXT NULL,
    imap_port INTEGER NULL,
    daily_limit INTEGER NOT NULL,
    signature TEXT NULL
);

CREATE TABLE IF NOT EXISTS bi_leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    business_name TEXT NOT NULL,
    city TEXT NOT NULL,
    country TEXT NOT NULL,
    website TEXT NULL,
    phone TEXT NULL,
    industry TEXT NULL,
    analysis_status TEXT NOT NULL DEFAULT 'Pending',
    pushed_to_caller INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_bi_leads_name_city
    ON bi_leads(lower(trim(business_name)), lower(trim(city)));

CREATE TABLE IF NOT EXISTS bi_analysis (
    lead_id INTEGER PRIMARY KEY REFERENCES bi_leads(id) ON DELETE CASCADE,
    google_rating REAL NULL,
    review_count INTEGER NOT NULL DEFAULT 0,
    competitors_found INTEGER NOT NULL DEFAULT 0,
    website_score INTEGER NULL,
    summary TEXT NULL,
    opportunities TEXT NOT NULL DEFAULT '[]', -- JSON array
    analyzed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS voice_ai_campaigns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    agent_id TEXT NULL,
    status TEXT NOT NULL DEFAULT 'Draft',
    max_attempts INTEGER NOT NULL DEFAULT 3,
    description TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS voice_ai_leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    email TEXT NULL,
    company TEXT NULL,
    status TEXT NOT NULL DEFAULT 'Pending',
    campaign_id INTEGER NULL REFERENCES voice_ai_campaigns(id) ON DELETE SET NULL,
    call_attempts INTEGER NOT NULL DEFAULT 0,
    last_called_at TEXT NULL,
    notes TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS voice_ai_call_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id INTEGER NOT NULL REFERENCES voice_ai_campaigns(id) ON DELETE CASCADE,
    lead_id INTEGER NOT NULL REFERENCES voice_ai_leads(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'Queued',
    attempts INTEGER NOT NULL DEFAULT 0,
    retell_call_id TEXT NULL,
    result TEXT NULL,
    scheduled_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_status ON voice_ai_call_queue(status, scheduled_at);
CREATE INDEX IF NOT EXISTS idx_queue_retell_call ON voice_ai_call_queue(retell_call_id);

CREATE TABLE IF NOT EXISTS voice_ai_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    retell_agent_id TEXT NULL,
    from_number TEXT NULL,
    max_concurrent_calls INTEGER NOT NULL,
    call_window_start TEXT NOT NULL,
    call_window_end TEXT NOT NULL,
    timezone TEXT NOT NULL
);
"#;
