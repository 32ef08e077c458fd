// Database models for the GymKit backend

pub mod check_in;
pub mod lifecycle_event;
pub mod member;
pub mod payment_record;
pub mod prospect;
pub mod referral;
pub mod staff;
pub mod tenant;

pub use check_in::{CheckIn, CheckInError, CheckInResponse, NewCheckIn};
pub use lifecycle_event::{
    event_types, LifecycleEvent, LifecycleEventError, NewLifecycleEvent,
};
pub use member::{
    CreateMemberRequest, Member, MemberError, MemberResponse, MemberStatus, MemberUpdate,
    NewMember, UpdateMemberRequest,
};
pub use payment_record::{
    NewPaymentRecord, PaymentRecord, PaymentRecordError, PaymentRecordResponse,
    RecordPaymentRequest,
};
pub use prospect::{
    CreateProspectRequest, NewProspect, Prospect, ProspectError, ProspectResponse,
    ProspectStatus, ProspectUpdate, UpdateProspectRequest,
};
pub use referral::{Referral, ReferralError};
pub use staff::{
    CreateStaffRequest, NewStaff, Staff, StaffError, StaffResponse, StaffUpdate,
    UpdateStaffRequest,
};
pub use tenant::{
    BillingMode, GymProfile, PlanType, SubscriptionStatus, Tenant, TenantError, TenantUpdate,
};
