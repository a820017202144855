//! Per-agent tool schemas
//!
//! Each agent's tool set is closed: the dispatcher rejects any name not
//! listed here.

use agenthub_provider::{object_schema, ParamKind, Tool};

use crate::registry::AgentType;

/// One tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

/// Tool name, description and parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
}

impl ToolSchema {
    pub fn to_tool(&self) -> Tool {
        let properties: Vec<(&str, ParamKind, &str, bool)> = self
            .params
            .iter()
            .map(|p| (p.name, p.kind, p.description, p.required))
            .collect();
        Tool::new(self.name, self.description, object_schema(&properties))
    }
}

/// Tool schemas for an agent, in declaration order
pub fn tool_schemas(agent: AgentType) -> &'static [ToolSchema] {
    match agent {
        AgentType::Bookkeeper => BOOKKEEPER,
        AgentType::InboxCommander => INBOX,
        AgentType::HireWell => HIRING,
        AgentType::CustomerCare => CUSTOMER_CARE,
        AgentType::SocialPilot => SOCIAL_PILOT,
        AgentType::Appointment => APPOINTMENT,
        AgentType::ComplianceGuard => COMPLIANCE,
        AgentType::VendorNegotiator => VENDOR,
        AgentType::ProposalPro => PROPOSAL,
        AgentType::InventoryIq => INVENTORY,
        AgentType::ReputationShield => REPUTATION,
        AgentType::CashflowCommander => CASHFLOW,
    }
}

/// Schemas rendered for the provider
pub fn provider_tools(agent: AgentType) -> Vec<Tool> {
    tool_schemas(agent).iter().map(ToolSchema::to_tool).collect()
}

pub fn has_tool(agent: AgentType, name: &str) -> bool {
    tool_schemas(agent).iter().any(|schema| schema.name == name)
}

const STR: ParamKind = ParamKind::String;
const INT: ParamKind = ParamKind::Integer;
const NUM: ParamKind = ParamKind::Number;
const BOOL: ParamKind = ParamKind::Boolean;
const LIST: ParamKind = ParamKind::StringArray;

const fn req(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        description,
        required: true,
    }
}

const fn opt(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        description,
        required: false,
    }
}

const BOOKKEEPER: &[ToolSchema] = &[
    ToolSchema {
        name: "get_transactions",
        description: "Fetch transactions from QuickBooks within a date range",
        params: &[
            req("start_date", STR, "Start date in YYYY-MM-DD format"),
            req("end_date", STR, "End date in YYYY-MM-DD format"),
            opt("account_id", STR, "Optional: Filter by specific account ID"),
        ],
    },
    ToolSchema {
        name: "categorize_transaction",
        description: "Categorize a transaction in QuickBooks",
        params: &[
            req("transaction_id", STR, "The transaction ID to categorize"),
            req("category", STR, "The category/account to assign"),
            opt("memo", STR, "Optional memo for the categorization"),
        ],
    },
    ToolSchema {
        name: "get_accounts",
        description: "Get list of accounts from QuickBooks",
        params: &[
            opt("account_type", STR, "Optional: Filter by account type"),
        ],
    },
    ToolSchema {
        name: "get_account_balance",
        description: "Get the balance of a specific account",
        params: &[
            req("account_id", STR, "The account ID to check"),
        ],
    },
    ToolSchema {
        name: "create_expense_report",
        description: "Generate an expense report for a date range",
        params: &[
            req("start_date", STR, "Start date in YYYY-MM-DD format"),
            req("end_date", STR, "End date in YYYY-MM-DD format"),
            opt("group_by", STR, "Group by: 'category', 'vendor', 'month'"),
        ],
    },
    ToolSchema {
        name: "flag_for_review",
        description: "Flag a transaction for human review",
        params: &[
            req("transaction_id", STR, "The transaction ID to flag"),
            req("reason", STR, "Reason for flagging"),
            opt("suggested_action", STR, "Suggested action for the reviewer"),
        ],
    },
];

const INBOX: &[ToolSchema] = &[
    ToolSchema {
        name: "get_emails",
        description: "Fetch emails from Gmail inbox with optional filtering by query, label, or unread status",
        params: &[
            opt("query", STR, "Gmail search query (e.g., 'from:boss@company.com', 'subject:urgent')"),
            opt("label", STR, "Filter by label (e.g., 'INBOX', 'IMPORTANT', 'STARRED')"),
            opt("max_results", INT, "Maximum number of emails to return (default: 20, max: 50)"),
            opt("unread_only", BOOL, "Only return unread emails"),
        ],
    },
    ToolSchema {
        name: "get_email_by_id",
        description: "Get the full content of a specific email by its ID",
        params: &[
            req("email_id", STR, "The Gmail message ID"),
        ],
    },
    ToolSchema {
        name: "triage_inbox",
        description: "Analyze and categorize recent emails into Urgent, Needs Response, Informational, and Low Priority",
        params: &[
            opt("time_window_hours", INT, "How many hours back to analyze (default: 24)"),
        ],
    },
    ToolSchema {
        name: "draft_response",
        description: "Create a draft reply to an email. The draft will be saved for user review before sending.",
        params: &[
            req("email_id", STR, "The ID of the email to reply to"),
            req("response_body", STR, "The body text of the reply"),
            opt("include_original", BOOL, "Include the original email in the reply (default: true)"),
        ],
    },
    ToolSchema {
        name: "send_email",
        description: "Send a new email or reply. Use with caution - prefer draft_response for replies.",
        params: &[
            req("to", STR, "Recipient email address"),
            req("subject", STR, "Email subject line"),
            req("body", STR, "Email body text"),
            opt("cc", STR, "CC recipients (comma-separated)"),
            opt("reply_to_id", STR, "Optional: ID of email this is replying to"),
        ],
    },
    ToolSchema {
        name: "schedule_followup",
        description: "Schedule a follow-up reminder for an email",
        params: &[
            req("email_id", STR, "The email ID to follow up on"),
            req("followup_date", STR, "Date for follow-up in YYYY-MM-DD format"),
            req("followup_note", STR, "Note about what to follow up on"),
        ],
    },
    ToolSchema {
        name: "extract_action_items",
        description: "Extract action items and tasks from an email's content",
        params: &[
            req("email_id", STR, "The email ID to analyze for action items"),
        ],
    },
    ToolSchema {
        name: "apply_label",
        description: "Apply a label to an email for organization",
        params: &[
            req("email_id", STR, "The email ID to label"),
            req("label_name", STR, "Label name to apply (will be created if doesn't exist)"),
        ],
    },
    ToolSchema {
        name: "mark_as_read",
        description: "Mark an email as read",
        params: &[
            req("email_id", STR, "The email ID to mark as read"),
        ],
    },
    ToolSchema {
        name: "archive_email",
        description: "Archive an email (remove from inbox but keep in All Mail)",
        params: &[
            req("email_id", STR, "The email ID to archive"),
        ],
    },
    ToolSchema {
        name: "get_followups_due",
        description: "Get list of scheduled follow-ups that are due today or overdue",
        params: &[],
    },
];

const HIRING: &[ToolSchema] = &[
    ToolSchema {
        name: "get_candidate_emails",
        description: "Fetch emails related to job applications and candidates",
        params: &[
            opt("job_title", STR, "Filter by job title/position"),
            opt("days_back", INT, "Number of days to look back (default: 30)"),
            opt("max_results", INT, "Maximum results to return (default: 50)"),
        ],
    },
    ToolSchema {
        name: "screen_resume",
        description: "Screen a candidate's resume/application against job requirements",
        params: &[
            req("email_id", STR, "The email ID containing the application"),
            req("job_requirements", LIST, "List of required qualifications"),
            opt("preferred_qualifications", LIST, "List of preferred qualifications"),
        ],
    },
    ToolSchema {
        name: "schedule_interview",
        description: "Schedule an interview with a candidate",
        params: &[
            req("candidate_email", STR, "Candidate's email address"),
            req("candidate_name", STR, "Candidate's full name"),
            req("job_title", STR, "Position being interviewed for"),
            opt("duration_minutes", INT, "Interview duration (default: 60)"),
            opt("interview_type", STR, "Type: phone_screen, technical, behavioral, final, panel"),
            opt("interviewers", LIST, "List of interviewer email addresses"),
            opt("preferred_days_ahead", INT, "Days to search for slots (default: 7)"),
        ],
    },
    ToolSchema {
        name: "send_status_update",
        description: "Send a status update email to a candidate",
        params: &[
            req("candidate_email", STR, "Candidate's email address"),
            req("candidate_name", STR, "Candidate's full name"),
            req("status", STR, "Status: application_received, interview_scheduled, under_review, moved_forward, rejection"),
            req("job_title", STR, "Position title"),
            opt("custom_message", STR, "Optional custom message to include"),
            opt("next_steps", STR, "Optional next steps information"),
        ],
    },
    ToolSchema {
        name: "get_pipeline_status",
        description: "Get overview of the hiring pipeline status",
        params: &[
            opt("job_title", STR, "Filter by specific job title"),
        ],
    },
    ToolSchema {
        name: "coordinate_reference_check",
        description: "Send a reference check request email",
        params: &[
            req("candidate_name", STR, "Candidate's full name"),
            req("candidate_email", STR, "Candidate's email"),
            req("reference_email", STR, "Reference person's email"),
            req("reference_name", STR, "Reference person's name"),
            req("job_title", STR, "Position title"),
        ],
    },
    ToolSchema {
        name: "get_candidates_needing_followup",
        description: "Identify candidates who haven't been contacted recently",
        params: &[
            opt("days_without_contact", INT, "Days threshold (default: 7)"),
        ],
    },
];

const CUSTOMER_CARE: &[ToolSchema] = &[
    ToolSchema {
        name: "get_tickets",
        description: "Fetch support tickets with optional filtering by status and priority",
        params: &[
            opt("status", STR, "Filter by status: open, pending, solved, closed"),
            opt("priority", STR, "Filter by priority: low, normal, high, urgent"),
            opt("max_results", INT, "Maximum tickets to return (default: 20)"),
        ],
    },
    ToolSchema {
        name: "get_ticket_by_id",
        description: "Get detailed information about a specific ticket including conversation history",
        params: &[
            req("ticket_id", STR, "The ticket ID to retrieve"),
        ],
    },
    ToolSchema {
        name: "answer_ticket",
        description: "Post a response to a support ticket (public reply or internal note)",
        params: &[
            req("ticket_id", STR, "The ticket ID to respond to"),
            req("response", STR, "The response message"),
            opt("internal_note", BOOL, "If true, post as internal note (not visible to customer)"),
            opt("set_status", STR, "Optionally change ticket status: open, pending, solved"),
        ],
    },
    ToolSchema {
        name: "escalate_ticket",
        description: "Escalate a ticket to a higher support tier",
        params: &[
            req("ticket_id", STR, "The ticket ID to escalate"),
            req("reason", STR, "Reason for escalation"),
            opt("escalation_level", STR, "Escalation level: tier2, tier3, manager, engineering"),
            opt("assign_to", STR, "Optional: specific person to assign to"),
        ],
    },
    ToolSchema {
        name: "generate_response",
        description: "Generate a suggested response based on ticket content and category",
        params: &[
            req("ticket_id", STR, "The ticket ID to generate response for"),
            opt("response_type", STR, "Response tone: helpful, apologetic, informative"),
            opt("include_kb_link", BOOL, "Include link to help center"),
        ],
    },
    ToolSchema {
        name: "track_satisfaction",
        description: "Get customer satisfaction metrics and trends",
        params: &[
            opt("days_back", INT, "Number of days to analyze (default: 30)"),
        ],
    },
    ToolSchema {
        name: "get_pending_tickets",
        description: "Get tickets that need attention, categorized by priority and age",
        params: &[],
    },
];

const SOCIAL_PILOT: &[ToolSchema] = &[
    ToolSchema {
        name: "create_post",
        description: "Create a social media post draft",
        params: &[
            req("content", STR, "The post content/caption"),
            req("platform", STR, "Platform: facebook, instagram, linkedin, twitter"),
            opt("media_url", STR, "Optional URL to image/video"),
            opt("link", STR, "Optional link to include"),
            opt("hashtags", LIST, "List of hashtags to add"),
        ],
    },
    ToolSchema {
        name: "schedule_content",
        description: "Schedule a post for future publishing",
        params: &[
            req("content", STR, "The post content"),
            req("platform", STR, "Platform: facebook, instagram, linkedin, twitter"),
            req("scheduled_time", STR, "ISO format datetime for publishing"),
            opt("media_url", STR, "Optional media URL"),
            opt("hashtags", LIST, "Hashtags to include"),
        ],
    },
    ToolSchema {
        name: "get_scheduled_posts",
        description: "Get all scheduled posts",
        params: &[
            opt("platform", STR, "Filter by platform"),
            opt("status", STR, "Filter by status (default: scheduled)"),
        ],
    },
    ToolSchema {
        name: "respond_to_comment",
        description: "Respond to a comment on a post",
        params: &[
            req("post_id", STR, "The post ID"),
            req("comment_id", STR, "The comment ID to respond to"),
            req("response", STR, "The response text"),
            opt("platform", STR, "Platform (default: facebook)"),
        ],
    },
    ToolSchema {
        name: "get_comments",
        description: "Get comments on posts",
        params: &[
            opt("post_id", STR, "Specific post ID (optional)"),
            opt("platform", STR, "Platform (default: facebook)"),
            opt("unanswered_only", BOOL, "Only show unanswered comments"),
        ],
    },
    ToolSchema {
        name: "generate_content_ideas",
        description: "Generate content ideas based on topic and platform",
        params: &[
            req("topic", STR, "Topic or theme for content"),
            opt("platform", STR, "Target platform"),
            opt("tone", STR, "Tone: professional, casual, humorous, inspirational"),
            opt("count", INT, "Number of ideas to generate (default: 5)"),
        ],
    },
    ToolSchema {
        name: "generate_report",
        description: "Generate social media performance report",
        params: &[
            opt("platform", STR, "Platform or 'all' (default: all)"),
            opt("days_back", INT, "Days to analyze (default: 30)"),
        ],
    },
    ToolSchema {
        name: "get_analytics",
        description: "Get detailed analytics for a platform",
        params: &[
            req("platform", STR, "Platform to analyze"),
            opt("metric_type", STR, "Type: engagement, reach, followers"),
        ],
    },
];

const APPOINTMENT: &[ToolSchema] = &[
    ToolSchema {
        name: "get_upcoming_events",
        description: "Get upcoming calendar events for a specified number of days",
        params: &[
            opt("days_ahead", INT, "Number of days to look ahead (default: 7)"),
            opt("max_results", INT, "Maximum number of events to return (default: 25)"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "get_event_by_id",
        description: "Get details of a specific calendar event",
        params: &[
            req("event_id", STR, "The calendar event ID"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "find_available_slots",
        description: "Find available time slots for booking appointments",
        params: &[
            opt("duration_minutes", INT, "Duration of the appointment in minutes (default: 60)"),
            opt("days_ahead", INT, "Number of days to search (default: 7)"),
            opt("working_hours_start", INT, "Start of working hours (default: 9)"),
            opt("working_hours_end", INT, "End of working hours (default: 17)"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "book_appointment",
        description: "Book a new appointment on the calendar",
        params: &[
            req("summary", STR, "Title/name of the appointment"),
            req("start_time", STR, "Start time in ISO format (e.g., '2024-01-15T14:00:00Z')"),
            req("end_time", STR, "End time in ISO format"),
            opt("description", STR, "Description or notes for the appointment"),
            opt("location", STR, "Location or video meeting link"),
            opt("attendees", LIST, "List of attendee email addresses"),
            opt("send_notifications", BOOL, "Whether to notify attendees (default: true)"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "reschedule_appointment",
        description: "Reschedule an existing appointment to a new time",
        params: &[
            req("event_id", STR, "The event ID to reschedule"),
            req("new_start_time", STR, "New start time in ISO format"),
            req("new_end_time", STR, "New end time in ISO format"),
            opt("notify_attendees", BOOL, "Whether to notify attendees (default: true)"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "cancel_appointment",
        description: "Cancel an existing appointment",
        params: &[
            req("event_id", STR, "The event ID to cancel"),
            opt("notify_attendees", BOOL, "Whether to notify attendees (default: true)"),
            opt("cancellation_reason", STR, "Reason for cancellation"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "send_reminder",
        description: "Send a reminder for an upcoming appointment",
        params: &[
            req("event_id", STR, "The event ID to send reminder for"),
            opt("reminder_message", STR, "Custom reminder message"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "get_todays_schedule",
        description: "Get today's complete schedule with upcoming and past events",
        params: &[
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "check_conflicts",
        description: "Check if a proposed time slot has any scheduling conflicts",
        params: &[
            req("start_time", STR, "Proposed start time in ISO format"),
            req("end_time", STR, "Proposed end time in ISO format"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "add_attendee",
        description: "Add an attendee to an existing calendar event",
        params: &[
            req("event_id", STR, "The event ID"),
            req("attendee_email", STR, "Email of the attendee to add"),
            opt("notify", BOOL, "Whether to notify the new attendee (default: true)"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
    ToolSchema {
        name: "get_no_show_risks",
        description: "Identify appointments at risk of no-shows based on attendee responses and other factors",
        params: &[
            opt("days_ahead", INT, "Number of days to analyze (default: 3)"),
            opt("calendar_id", STR, "Calendar ID (default: 'primary')"),
        ],
    },
];

const COMPLIANCE: &[ToolSchema] = &[
    ToolSchema {
        name: "monitor_regulations",
        description: "Monitor regulatory changes and updates relevant to the business",
        params: &[
            opt("industry", STR, "Industry type: general, healthcare, finance, retail, technology"),
            opt("jurisdiction", STR, "Jurisdiction: federal, state, local, international"),
            opt("categories", LIST, "Categories to monitor: privacy, tax, employment, safety, environmental"),
        ],
    },
    ToolSchema {
        name: "track_deadlines",
        description: "Track compliance deadlines and upcoming requirements",
        params: &[
            opt("days_ahead", INT, "Number of days to look ahead (default: 90)"),
            opt("include_completed", BOOL, "Include completed deadlines (default: false)"),
        ],
    },
    ToolSchema {
        name: "audit_compliance",
        description: "Audit current compliance status across different areas",
        params: &[
            opt("area", STR, "Area to audit: all, data_privacy, financial, employment, licensing"),
            opt("detailed", BOOL, "Include detailed check results (default: true)"),
        ],
    },
    ToolSchema {
        name: "generate_policy",
        description: "Generate a compliance policy document",
        params: &[
            req("policy_type", STR, "Policy type: privacy, data_retention, acceptable_use, incident_response"),
            opt("company_name", STR, "Company name to use in the policy"),
            opt("industry", STR, "Industry for context: general, healthcare, finance, retail, technology"),
        ],
    },
    ToolSchema {
        name: "prepare_audit_report",
        description: "Prepare an audit-ready compliance report",
        params: &[
            opt("report_type", STR, "Report type: comprehensive, executive_summary, detailed"),
            opt("period_days", INT, "Period to cover in days (default: 90)"),
        ],
    },
];

const VENDOR: &[ToolSchema] = &[
    ToolSchema {
        name: "analyze_contracts",
        description: "Analyze vendor contracts and extract key terms, costs, and renewal dates",
        params: &[
            opt("vendor_name", STR, "Filter by vendor name (partial match)"),
            opt("category", STR, "Filter by category: software, services, supplies, logistics"),
            opt("expiring_within_days", INT, "Only show contracts expiring within N days"),
        ],
    },
    ToolSchema {
        name: "benchmark_pricing",
        description: "Benchmark vendor pricing against market rates to identify if you're overpaying",
        params: &[
            req("vendor_name", STR, "Name of the vendor"),
            req("category", STR, "Category: software, services, supplies, logistics"),
            req("current_price", NUM, "Current monthly price being paid"),
            opt("service_description", STR, "Description of the service for better matching"),
        ],
    },
    ToolSchema {
        name: "identify_savings",
        description: "Identify savings opportunities across all vendor relationships",
        params: &[
            opt("min_savings_threshold", NUM, "Minimum annual savings to include (default: 100)"),
        ],
    },
    ToolSchema {
        name: "draft_negotiation",
        description: "Draft a negotiation email or script for vendor discussions",
        params: &[
            req("vendor_name", STR, "Name of the vendor"),
            req("negotiation_type", STR, "Type: renewal, price_reduction, service_upgrade, cancellation_prevention"),
            req("current_terms", STR, "Summary of current contract terms"),
            req("desired_outcome", STR, "What you want to achieve"),
            opt("tone", STR, "Tone: professional, firm, or friendly (default: professional)"),
        ],
    },
    ToolSchema {
        name: "track_renewals",
        description: "Track upcoming contract renewals and required actions",
        params: &[
            opt("days_ahead", INT, "Number of days to look ahead (default: 90)"),
        ],
    },
];

const PROPOSAL: &[ToolSchema] = &[
    ToolSchema {
        name: "generate_proposal",
        description: "Generate a customized proposal for a client project",
        params: &[
            req("client_name", STR, "Name of the client/company"),
            req("project_title", STR, "Title of the project"),
            req("project_description", STR, "Description of what the project entails"),
            req("services", LIST, "List of services/deliverables to include"),
            opt("estimated_value", NUM, "Estimated project value in dollars"),
            opt("timeline_weeks", INT, "Estimated timeline in weeks"),
            opt("template", STR, "Template type: standard, detailed, or brief"),
        ],
    },
    ToolSchema {
        name: "respond_to_rfp",
        description: "Generate a comprehensive response to an RFP (Request for Proposal)",
        params: &[
            req("rfp_title", STR, "Title of the RFP"),
            req("client_name", STR, "Name of the issuing organization"),
            req("requirements", LIST, "List of RFP requirements to address"),
            req("deadline", STR, "RFP submission deadline (YYYY-MM-DD)"),
            opt("budget_range", STR, "Client's stated budget range if known"),
            opt("evaluation_criteria", LIST, "Evaluation criteria mentioned in RFP"),
        ],
    },
    ToolSchema {
        name: "price_project",
        description: "Generate intelligent pricing for a project based on scope and complexity",
        params: &[
            req("project_type", STR, "Type: consulting, development, design, marketing, implementation, training, support, strategy"),
            req("scope_items", LIST, "List of scope items/deliverables to price"),
            opt("complexity", STR, "Complexity level: low, medium, high, very_high"),
            opt("timeline_preference", STR, "Timeline: rushed, accelerated, standard, flexible"),
            opt("include_options", BOOL, "Include tiered pricing options (default: true)"),
        ],
    },
    ToolSchema {
        name: "track_proposal",
        description: "Track proposal status and deal pipeline progress",
        params: &[
            opt("proposal_id", STR, "Specific proposal ID to track (optional)"),
            opt("status_filter", STR, "Filter by status: draft, sent, negotiating, won, lost"),
            opt("days_back", INT, "Number of days to look back (default: 90)"),
        ],
    },
    ToolSchema {
        name: "analyze_win_rate",
        description: "Analyze win/loss patterns to improve proposal success rate",
        params: &[
            opt("period_days", INT, "Analysis period in days (default: 180)"),
        ],
    },
];

const INVENTORY: &[ToolSchema] = &[
    ToolSchema {
        name: "forecast_demand",
        description: "Forecast demand for products based on historical patterns and seasonality",
        params: &[
            opt("product_id", STR, "Specific product ID to forecast (optional)"),
            opt("category", STR, "Filter by product category"),
            opt("forecast_days", INT, "Number of days to forecast (default: 30)"),
            opt("include_seasonality", BOOL, "Include seasonal adjustments (default: true)"),
        ],
    },
    ToolSchema {
        name: "generate_purchase_order",
        description: "Generate purchase orders for inventory replenishment",
        params: &[
            opt("product_id", STR, "Specific product ID to order (optional, auto-detects if not specified)"),
            opt("supplier_id", STR, "Preferred supplier ID"),
            opt("auto_calculate", BOOL, "Automatically calculate quantities based on forecast (default: true)"),
        ],
    },
    ToolSchema {
        name: "optimize_inventory",
        description: "Optimize inventory levels to reduce costs and prevent stockouts",
        params: &[
            opt("optimization_type", STR, "Type: all, overstock, understock, reorder_points, dead_stock"),
            opt("target_service_level", NUM, "Target service level 0-1 (default: 0.95)"),
        ],
    },
    ToolSchema {
        name: "track_supplier",
        description: "Track supplier performance, reliability, and order history",
        params: &[
            opt("supplier_id", STR, "Specific supplier ID to track (optional)"),
            opt("include_performance", BOOL, "Include performance metrics (default: true)"),
        ],
    },
    ToolSchema {
        name: "identify_slow_movers",
        description: "Identify slow-moving and dead stock items that need attention",
        params: &[
            opt("days_threshold", INT, "Days of stock threshold to consider slow-moving (default: 90)"),
            opt("include_recommendations", BOOL, "Include action recommendations (default: true)"),
        ],
    },
];

const REPUTATION: &[ToolSchema] = &[
    ToolSchema {
        name: "monitor_reviews",
        description: "Monitor reviews across connected platforms",
        params: &[
            opt("platforms", LIST, "Platforms to monitor (google, yelp, facebook)"),
            opt("days_back", INT, "Days to look back (default: 30)"),
            opt("min_rating", INT, "Filter by maximum rating (to find negative reviews)"),
        ],
    },
    ToolSchema {
        name: "draft_response",
        description: "Draft a response to a review",
        params: &[
            req("review_id", STR, "The review ID to respond to"),
            req("review_text", STR, "The review text content"),
            req("rating", INT, "The review rating (1-5)"),
            req("reviewer_name", STR, "Name of the reviewer"),
            opt("response_tone", STR, "Tone: professional or casual (default: professional)"),
        ],
    },
    ToolSchema {
        name: "request_reviews",
        description: "Generate review request emails for customers",
        params: &[
            req("customer_emails", LIST, "List of customer email addresses"),
            req("customer_names", LIST, "List of customer names (same order as emails)"),
            opt("platform", STR, "Platform to request review on (google, yelp, facebook)"),
            opt("custom_message", STR, "Custom message template (use {name} and {platform} placeholders)"),
        ],
    },
    ToolSchema {
        name: "analyze_sentiment",
        description: "Analyze review sentiment trends over time",
        params: &[
            opt("time_period_days", INT, "Number of days to analyze (default: 90)"),
        ],
    },
    ToolSchema {
        name: "track_competitors",
        description: "Set up tracking for competitor businesses",
        params: &[
            req("competitor_names", LIST, "Names of competitor businesses to track"),
        ],
    },
    ToolSchema {
        name: "get_crisis_alerts",
        description: "Check for reputation crisis indicators and urgent alerts",
        params: &[],
    },
];

const CASHFLOW: &[ToolSchema] = &[
    ToolSchema {
        name: "project_cashflow",
        description: "Project cash flow for the next N days based on historical patterns",
        params: &[
            opt("days_ahead", INT, "Number of days to project (default: 90)"),
            opt("include_recurring", BOOL, "Include recurring transactions (default: true)"),
        ],
    },
    ToolSchema {
        name: "prioritize_collections",
        description: "Analyze and prioritize accounts receivable for collection",
        params: &[
            opt("min_amount", NUM, "Minimum amount to include (default: 100)"),
            opt("days_overdue_threshold", INT, "Days overdue threshold (default: 30)"),
        ],
    },
    ToolSchema {
        name: "optimize_payments",
        description: "Optimize payment timing to maximize cash position",
        params: &[
            opt("available_cash", NUM, "Available cash for payments (auto-detected if not provided)"),
        ],
    },
    ToolSchema {
        name: "send_invoice_reminder",
        description: "Generate a payment reminder for an overdue invoice",
        params: &[
            req("customer_name", STR, "Customer name"),
            req("customer_email", STR, "Customer email address"),
            req("invoice_number", STR, "Invoice number"),
            req("amount", NUM, "Amount due"),
            req("days_overdue", INT, "Number of days overdue"),
        ],
    },
    ToolSchema {
        name: "score_customer_risk",
        description: "Assess payment risk score for a customer based on history",
        params: &[
            req("customer_name", STR, "Customer name to analyze"),
        ],
    },
    ToolSchema {
        name: "get_cash_alerts",
        description: "Get current cash flow alerts and warnings",
        params: &[],
    },
];
